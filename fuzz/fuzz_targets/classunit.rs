#![no_main]

use libfuzzer_sys::fuzz_target;
use crossmap::{
    mappings::{table::CompositeTable, SymbolKind},
    pipeline::RemapEnvironment,
    ClassUnit, RemapConfig,
};
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let Ok(mut unit) = ClassUnit::decode(data) else {
        return;
    };

    // Anything that decodes must encode back to the same bytes
    let encoded = unit.encode().expect("decoded unit re-encodes");
    assert_eq!(encoded, data);

    let table = Arc::new(CompositeTable::from_pairs([
        (SymbolKind::Class, "net/minecraft/class_1", "net/minecraft/Entity"),
        (SymbolKind::Method, "method_1", "tick"),
    ]));
    let environment = RemapEnvironment::new(table, RemapConfig::production(), None);
    let _ = environment.rewrite(&mut unit);
});
