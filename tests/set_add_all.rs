mod common;

use lset::{Error, Lset, Value};
use test_log::test;

#[test]
fn first_failure_aborts_the_rest() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    let mut set = Lset::new(&mut top, &mut host, "myset")?;

    let values = [
        Value::from(10),
        Value::from(20),
        Value::from(30),
        Value::from(10),
    ];

    assert!(matches!(
        set.add_all(&values, None),
        Err(Error::UniqueKeyViolation),
    ));

    // The prefix before the duplicate is in.
    assert_eq!(3, set.size()?);
    assert_eq!(
        vec!["10", "20", "30"],
        common::canonical_sorted(&set.scan(None)?),
    );

    Ok(())
}

#[test]
fn all_unique_values_go_in() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    let mut set = Lset::new(&mut top, &mut host, "myset")?;

    let values: Vec<Value> = (0..50).map(Value::from).collect();
    set.add_all(&values, None)?;

    assert_eq!(50, set.size()?);

    Ok(())
}

#[test]
fn failure_on_the_first_element_changes_nothing() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    let mut set = Lset::new(&mut top, &mut host, "myset")?;

    set.add(&Value::from(10), None)?;

    assert!(matches!(
        set.add_all(&[Value::from(10), Value::from(40)], None),
        Err(Error::UniqueKeyViolation),
    ));

    assert_eq!(1, set.size()?);
    assert!(!set.exists(&Value::from(40))?);

    Ok(())
}
