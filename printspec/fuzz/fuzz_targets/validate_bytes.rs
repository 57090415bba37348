#![no_main]

use libfuzzer_sys::fuzz_target;
use printspec::io::{InputItem, ItemKind};
use printspec::{ValidationConfig, Validator};
use std::sync::{Arc, OnceLock};

static VALIDATOR: OnceLock<Validator> = OnceLock::new();

fn validator() -> &'static Validator {
    VALIDATOR.get_or_init(|| Validator::new(Arc::new(ValidationConfig::default())))
}

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must always produce a report, never a panic.
    for kind in [ItemKind::Document, ItemKind::Image] {
        let item = InputItem::new("fuzz", kind, data.to_vec());
        let report = validator().validate(&item);

        // A report without error issues must be marked as passed
        assert_eq!(report.passed, report.error_count() == 0);
    }
});
