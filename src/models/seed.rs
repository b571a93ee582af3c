use chrono::NaiveDate;

use crate::constants::{KPIS, POLICY_ACTIONS, PROJECTS, SCORES};
use crate::models::value::{record, Record, Value};

fn day(y: i32, m: u32, d: u32) -> Value {
    NaiveDate::from_ymd_opt(y, m, d)
        .map(Value::Date)
        .unwrap_or_else(|| Value::Text(format!("{y:04}-{m:02}-{d:02}")))
}

fn kpi(department: &str, name: &str, target: i32, current: i32, status: &str) -> Record {
    record([
        ("Department", Value::from(department)),
        ("KPI", Value::from(name)),
        ("Target", Value::from(target)),
        ("Current", Value::from(current)),
        ("Status", Value::from(status)),
    ])
}

fn policy(action: &str, responsible: &str, due: Value, progress: &str) -> Record {
    record([
        ("Policy Action", Value::from(action)),
        ("Responsible", Value::from(responsible)),
        ("Due Date", due),
        ("Progress", Value::from(progress)),
    ])
}

fn score(department: &str, score: i32) -> Record {
    record([
        ("Department", Value::from(department)),
        ("Score", Value::from(score)),
    ])
}

fn project(name: &str, department: &str, lat: f64, lon: f64) -> Record {
    record([
        ("Project", Value::from(name)),
        ("Department", Value::from(department)),
        ("Latitude", Value::from(lat)),
        ("Longitude", Value::from(lon)),
        ("Status", Value::from("Ongoing")),
    ])
}

/// Demo rows written to empty tables at startup
pub fn demo_tables() -> Vec<(&'static str, Vec<Record>)> {
    vec![
        (
            KPIS,
            vec![
                kpi("Health", "Maternal Health Index", 85, 75, "Amber"),
                kpi("Education", "Literacy Rate", 90, 88, "Green"),
                kpi("Works", "Road Quality Score", 80, 70, "Amber"),
                kpi("Environment", "Air Quality Index", 70, 60, "Red"),
            ],
        ),
        (
            POLICY_ACTIONS,
            vec![
                policy("Upgrade city hospitals", "Health Dept.", day(2025, 12, 31), "Ongoing"),
                policy("Increase school funding", "Education Dept.", day(2025, 10, 1), "Planned"),
                policy("Rehabilitate roads", "Works Dept.", day(2025, 11, 30), "Delayed"),
                policy("Improve waste management", "Environment Dept.", day(2025, 9, 30), "Ongoing"),
            ],
        ),
        (
            SCORES,
            vec![
                score("Health", 76),
                score("Education", 88),
                score("Works", 72),
                score("Environment", 65),
            ],
        ),
        (
            PROJECTS,
            vec![
                project("Health Centre", "Health", 0.3136, 32.5811),
                project("New School", "Education", 0.3156, 32.5822),
                project("Road Upgrade", "Works", 0.3100, 32.5850),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::schema;

    #[test]
    fn test_demo_rows_fit_their_schemas() {
        for (table, rows) in demo_tables() {
            let schema = schema(table).unwrap();
            for row in &rows {
                assert_eq!(&schema.conform_candidate(row).unwrap(), row, "{table}");
            }
        }
    }

    #[test]
    fn test_demo_keys_are_unique() {
        for (table, rows) in demo_tables() {
            let keys = schema(table).unwrap().declared_keys();
            let mut seen = Vec::new();
            for row in &rows {
                let tuple: Vec<_> = keys.iter().map(|k| row.get(k).cloned()).collect();
                assert!(!seen.contains(&tuple), "duplicate key in {table}");
                seen.push(tuple);
            }
        }
    }
}
