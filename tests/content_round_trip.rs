use std::rc::Rc;

use csv_ingest::{
    audit::content_digest,
    data::coerce_value,
    declarations::ColumnDeclaration,
    ingest,
    rows::SourceRow,
    schema::{SchemaOptions, TableSchema, build_with_options},
    store::Store,
    types::LogicalType,
};
use proptest::prelude::*;

fn readings_schema() -> TableSchema {
    let declarations = vec![
        ColumnDeclaration::new("label", "string"),
        ColumnDeclaration::new("level", "float"),
        ColumnDeclaration::new("count", "integer"),
    ];
    let options = SchemaOptions {
        table_name: Some("readings".into()),
        ..SchemaOptions::default()
    };
    build_with_options(&declarations, &options).expect("schema")
}

fn float_values() -> impl Strategy<Value = f64> {
    prop::num::f64::POSITIVE
        | prop::num::f64::NEGATIVE
        | prop::num::f64::NORMAL
        | prop::num::f64::SUBNORMAL
        | prop::num::f64::ZERO
        | prop::num::f64::INFINITE
}

proptest! {
    #[test]
    fn stored_values_render_like_freshly_coerced_ones(
        label in "[ -~]{0,12}",
        level in float_values(),
        count in any::<i64>(),
    ) {
        let schema = readings_schema();
        let mut store = Store::open_in_memory().expect("store");
        store.materialize(&schema).expect("create");

        let raw = vec![label, level.to_string(), count.to_string()];
        let headers: Rc<[String]> = Rc::from(
            schema
                .column_names()
                .iter()
                .map(|name| name.to_string())
                .collect::<Vec<_>>(),
        );
        let row = SourceRow::new(1, headers, raw.clone());
        ingest::ingest(&mut store, &schema, vec![Ok(row)]).expect("ingest");

        let coerced = [LogicalType::String, LogicalType::Float, LogicalType::Integer]
            .iter()
            .zip(&raw)
            .map(|(ty, value)| coerce_value(value, *ty).expect("coercible"))
            .collect::<Vec<_>>();
        let names = schema.column_names();
        let expected = content_digest(
            &names.iter().copied().zip(coerced.iter().map(Some)).collect::<Vec<_>>(),
        );

        let records = store.records(&schema).expect("records");
        prop_assert_eq!(records.len(), 1);
        let stored = content_digest(
            &names
                .iter()
                .copied()
                .zip(records[0].values.iter().map(Option::as_ref))
                .collect::<Vec<_>>(),
        );
        prop_assert_eq!(stored, expected);
    }
}
