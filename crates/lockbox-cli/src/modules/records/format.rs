use lockbox_core::VaultRecord;

const MASK: &str = "********";

pub(crate) fn print_records_table(records: &[VaultRecord]) {
    let mut id_width = "ID".len();
    let mut title_width = "TITLE".len();
    for record in records {
        id_width = id_width.max(record.id.len());
        title_width = title_width.max(record.title.len());
    }

    println!(
        "{:<id_width$}  {:<title_width$}  USERNAME",
        "ID",
        "TITLE",
        id_width = id_width,
        title_width = title_width
    );
    for record in records {
        println!(
            "{:<id_width$}  {:<title_width$}  {}",
            record.id,
            record.title,
            record.username.as_deref().unwrap_or("-"),
            id_width = id_width,
            title_width = title_width
        );
    }
}

/// JSON view of a record; the password is masked unless `reveal` is set.
pub(crate) fn record_view(record: &VaultRecord, reveal: bool) -> VaultRecord {
    let mut view = record.clone();
    if !reveal && view.password.is_some() {
        view.password = Some(MASK.to_string());
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passwords_are_masked_unless_revealed() {
        let record = VaultRecord {
            password: Some("hunter2".to_string()),
            ..VaultRecord::new("Bank")
        };
        assert_eq!(record_view(&record, false).password.as_deref(), Some(MASK));
        assert_eq!(record_view(&record, true).password.as_deref(), Some("hunter2"));
        assert!(record_view(&VaultRecord::new("Empty"), false).password.is_none());
    }
}
