//! Key layout shared with other tools reading the same store.

/// Latest buffer snapshot for a file.
pub fn buffer_key(file_name: &str) -> String {
    format!("file_{file_name}")
}

pub fn documentation_key(file_name: &str) -> String {
    format!("{file_name}.documentation.json")
}

pub fn testing_key(file_name: &str) -> String {
    format!("{file_name}.testing.json")
}
