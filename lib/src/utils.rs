#[cfg(test)]
mod tests {
    use crate::output::Record;
    use failure::Error;
    use std::fmt::Debug;

    /// Utility function for testing: assert an error whose message contains
    /// the given substring.
    pub fn assert_error<T: Debug>(msg: &str, result: Result<T, Error>) {
        match result {
            Ok(value) => panic!("Expected Err but received Ok({:?})!", value),
            Err(error) => {
                let err_str = error.to_string();
                if !err_str.contains(msg) {
                    panic!(
                        "Expected error {:?} to contain substring \"{}\"",
                        err_str, msg
                    );
                }
            }
        }
    }

    /// Build a record from (tape, string) pairs.
    pub fn rec(fields: &[(&str, &str)]) -> Record {
        fields
            .iter()
            .map(|(tape, text)| (tape.to_string(), text.to_string()))
            .collect()
    }

    /// Assert that generated outputs match the expected records exactly,
    /// in any order.
    pub fn check_outputs(outputs: &[Record], expected: &[Record]) {
        assert_eq!(
            outputs.len(),
            expected.len(),
            "Should have {} result(s), got {:?}",
            expected.len(),
            outputs
        );
        for record in expected {
            assert!(
                outputs.contains(record),
                "Should have {:?} in outputs {:?}",
                record,
                outputs
            );
        }
        for record in outputs {
            assert!(
                expected.contains(record),
                "Should not have {:?} in outputs",
                record
            );
        }
    }

    /// Assert that two generations produced the same multiset of records.
    pub fn check_same_outputs(mut left: Vec<Record>, mut right: Vec<Record>) {
        left.sort();
        right.sort();
        assert_eq!(left, right);
    }
}

#[cfg(test)]
pub use tests::*;
