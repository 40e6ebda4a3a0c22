mod common;

use lset::{Error, Filter, Lset, Value};
use test_log::test;

fn above(min: i64) -> Filter {
    Filter::new("int_above", vec![Value::from(min)])
}

#[test]
fn scan_narrows_through_the_filter() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    let mut set = Lset::new(&mut top, &mut host, "nums")?;

    for x in 1..=6 {
        set.add(&Value::from(x), None)?;
    }

    assert_eq!(
        vec!["4", "5", "6"],
        common::canonical_sorted(&set.scan(Some(&above(3)))?),
    );

    // The filter narrows the view, not the set.
    assert_eq!(6, set.size()?);

    Ok(())
}

#[test]
fn get_honors_the_filter() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    let mut set = Lset::new(&mut top, &mut host, "nums")?;

    for x in 1..=6 {
        set.add(&Value::from(x), None)?;
    }

    assert_eq!(Value::from(6), set.get(&Value::from(6), Some(&above(5)))?);

    assert!(matches!(
        set.get(&Value::from(4), Some(&above(5))),
        Err(Error::NotFound),
    ));

    Ok(())
}

#[test]
fn remove_honors_the_filter() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    let mut set = Lset::new(&mut top, &mut host, "nums")?;

    for x in 1..=6 {
        set.add(&Value::from(x), None)?;
    }

    // A rejected match removes nothing.
    assert!(matches!(
        set.remove(&Value::from(2), Some(&above(5)), true),
        Err(Error::NotFound),
    ));
    assert!(set.exists(&Value::from(2))?);
    assert_eq!(6, set.size()?);

    assert_eq!(
        Some(Value::from(6)),
        set.remove(&Value::from(6), Some(&above(5)), true)?,
    );
    assert_eq!(5, set.size()?);

    Ok(())
}

#[test]
fn unknown_filter_name_is_refused() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    let mut set = Lset::new(&mut top, &mut host, "nums")?;

    set.add(&Value::from(1), None)?;

    assert!(matches!(
        set.scan(Some(&Filter::new("no_such_filter", Vec::new()))),
        Err(Error::UserModuleBad(_)),
    ));

    Ok(())
}
