use crate::models::classify;

pub fn classify_values(values: &[String]) {
    for value in values {
        println!("{:<16} {}", value, classify(value));
    }
}
