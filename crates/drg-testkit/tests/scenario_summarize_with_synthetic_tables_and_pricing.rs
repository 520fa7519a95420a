//! Runs the full `drg_classify::summarize` driver against tables and a
//! pricing file assembled purely from the testkit's byte encoders, with no
//! GHM decision tree table present. That means every cluster falls through
//! to the `90Z03Z` ungroupable fallback (error 4) rather than a real GHM,
//! and should find no GHS — this is the expected shape of a deployment
//! missing its decision tree file, not a degenerate test.

use drg_classify::summarize;
use drg_pricing::PricingSet;
use drg_schemas::{Date, DiagnosisCode, Sex};
use drg_stays::{ClusterMode, EntryInfo, ExitInfo, Stay};
use drg_tables::load_table_set;
use drg_testkit::{build_table_file, ghs_record, pricing_file, pricing_record, SectionSpec, TableSpec};

fn stay() -> Stay {
    Stay {
        stay_id: 1,
        bill_id: 1,
        birthdate: Date::new(2000, 1, 1),
        sex: Sex::Male,
        entry_date: Date::new(2024, 6, 1),
        exit_date: Date::new(2024, 6, 10),
        entry: EntryInfo { mode: 8, origin: 0 },
        exit: ExitInfo { mode: 8, destination: 0 },
        unit: None,
        session_count: 0,
        igs2: None,
        gestational_age: None,
        newborn_weight: None,
        last_menstrual_period: None,
        main_diagnosis: DiagnosisCode::parse("I10").unwrap(),
        linked_diagnosis: None,
        associated_diagnoses: Vec::new(),
        procedures: Vec::new(),
        errors: Vec::new(),
    }
}

#[test]
fn missing_decision_tree_falls_back_to_ungroupable_with_no_price() {
    let section = SectionSpec::new(21, ghs_record(4, 300, 6, [0, 5], 1, [145, 146]));
    let table = TableSpec {
        name: "GHSINFO",
        version: (11, 14),
        date_min_days: 16072,
        date_max_days: 16437,
        sections: vec![section],
    };
    let tables_bytes = build_table_file((1, 1, 24), &table);
    let table_set = load_table_set(&[("ghsinfo.tab".to_string(), tables_bytes)]).unwrap();

    let pricing_bytes = pricing_file(&[pricing_record("0145", 1, "00012345", "00000000", "20240101", "00000000")]);
    let pricing = PricingSet::load(&pricing_bytes).unwrap();

    let stays = vec![stay()];
    let results = summarize(&table_set, &stays, ClusterMode::StayModes, Some(&pricing), 0);

    assert_eq!(results.len(), 1);
    assert!(results[0].errors.contains(&4));
    assert!(results[0].ghs.is_none());
    assert!(results[0].price_cents.is_none());
}
