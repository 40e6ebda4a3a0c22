mod common;

use lset::{Error, Lset, Value};
use test_log::test;

fn setting<'a>(config: &'a Value, name: &str) -> Option<&'a Value> {
    config.as_map().and_then(|map| map.get(name))
}

#[test]
fn config_reflects_the_settings() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    let mut set = Lset::new(&mut top, &mut host, "myset")?;

    set.create(Some(&common::spec(&[
        ("Modulo", Value::from(13)),
        ("Threshold", Value::from(7)),
        ("HashCellMaxList", Value::from(3)),
        ("KeyFunction", Value::from("id_of")),
    ])))?;

    set.add(&Value::from(1), None)?;
    set.add(&Value::from(2), None)?;

    let config = set.config()?;

    assert_eq!(Some(&Value::from("myset")), setting(&config, "BinName"));
    assert_eq!(Some(&Value::from(13)), setting(&config, "Modulo"));
    assert_eq!(Some(&Value::from(7)), setting(&config, "Threshold"));
    assert_eq!(Some(&Value::from(3)), setting(&config, "HashCellMaxList"));
    assert_eq!(Some(&Value::from(2)), setting(&config, "ItemCount"));
    assert_eq!(Some(&Value::from(2)), setting(&config, "TotalCount"));
    assert_eq!(
        Some(&Value::from("ST_SUBRECORD")),
        setting(&config, "SetTypeStore"),
    );
    assert_eq!(Some(&Value::from("SM_LIST")), setting(&config, "StoreMode"));
    assert_eq!(Some(&Value::from("id_of")), setting(&config, "KeyFunction"));

    Ok(())
}

#[test]
fn total_count_survives_removals() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    let mut set = Lset::new(&mut top, &mut host, "myset")?;

    for x in 0..5 {
        set.add(&Value::from(x), None)?;
    }
    set.remove(&Value::from(0), None, false)?;
    set.remove(&Value::from(1), None, false)?;

    let config = set.config()?;

    assert_eq!(Some(&Value::from(3)), setting(&config, "ItemCount"));
    assert_eq!(Some(&Value::from(5)), setting(&config, "TotalCount"));

    Ok(())
}

#[test]
fn capacity_is_stored_but_not_enforced() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    let mut set = Lset::new(&mut top, &mut host, "myset")?;

    set.create(None)?;
    assert_eq!(0, set.get_capacity()?);

    set.set_capacity(500)?;
    assert_eq!(500, set.get_capacity()?);

    for x in 0..5 {
        set.add(&Value::from(x), None)?;
    }

    assert!(matches!(
        set.set_capacity(3),
        Err(Error::InputParam(_)),
    ));
    assert_eq!(500, set.get_capacity()?);

    set.set_capacity(0)?;
    assert_eq!(0, set.get_capacity()?);

    Ok(())
}

#[test]
fn dump_renders_the_whole_set() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    let mut set = Lset::new(&mut top, &mut host, "myset")?;

    set.create(Some(&common::spec(&[
        ("Modulo", Value::from(3)),
        ("Threshold", Value::from(2)),
        ("HashCellMaxList", Value::from(1)),
    ])))?;

    for x in 0..8 {
        set.add(&Value::from(x), None)?;
    }

    let dump = set.dump()?;

    assert!(dump.contains("myset"));
    assert!(dump.contains("SS_REGULAR"));
    assert!(dump.contains("subrec"));
    assert!(dump.contains("items=8"));

    Ok(())
}
