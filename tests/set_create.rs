mod common;

use lset::{Descriptor, Error, Lset, Value, BIN_FLAG_CONTROL, BIN_FLAG_RESTRICTED};
use test_log::test;

#[test]
fn create_twice_collides() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    Lset::new(&mut top, &mut host, "myset")?.create(None)?;

    assert!(matches!(
        Lset::new(&mut top, &mut host, "myset")?.create(None),
        Err(Error::BinExists(_)),
    ));

    Ok(())
}

#[test]
fn bin_name_rules() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    assert!(matches!(
        Lset::new(&mut top, &mut host, ""),
        Err(Error::BinNameNull),
    ));

    assert!(matches!(
        Lset::new(&mut top, &mut host, "fifteen_chars__"),
        Err(Error::BinNameTooLong(15)),
    ));

    Ok(())
}

#[test]
fn missing_record_is_reported() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    assert!(matches!(
        Lset::new(&mut top, &mut host, "myset")?.size(),
        Err(Error::TopRecordNotFound),
    ));

    Ok(())
}

#[test]
fn missing_bin_is_reported() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    Lset::new(&mut top, &mut host, "myset")?.create(None)?;

    assert!(matches!(
        Lset::new(&mut top, &mut host, "other")?.size(),
        Err(Error::BinNotFound(_)),
    ));

    Ok(())
}

#[test]
fn damaged_bin_is_reported() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    Lset::new(&mut top, &mut host, "myset")?.create(None)?;

    // Clobber the descriptor with something that is not one.
    top.set_bin("myset", Value::from(1), 0);

    assert!(matches!(
        Lset::new(&mut top, &mut host, "myset")?.size(),
        Err(Error::BinDamaged(_)),
    ));

    assert!(matches!(
        Lset::new(&mut top, &mut host, "myset")?.add(&Value::from(1), None),
        Err(Error::BinDamaged(_)),
    ));

    Ok(())
}

#[test]
fn newer_on_disk_version_is_refused() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    Lset::new(&mut top, &mut host, "myset")?.create(None)?;

    let mut desc = Descriptor::from_value(top.bin("myset").expect("descriptor bin"))?;
    desc.props.version += 1;
    let flags = top.bin_flags("myset").expect("descriptor flags");
    top.set_bin("myset", desc.to_value(), flags);

    assert!(matches!(
        Lset::new(&mut top, &mut host, "myset")?.size(),
        Err(Error::VersionMismatch(_, _)),
    ));

    Ok(())
}

#[test]
fn descriptor_bin_carries_control_flags() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    Lset::new(&mut top, &mut host, "myset")?.add(&Value::from(1), None)?;

    assert_eq!(
        Some(BIN_FLAG_RESTRICTED | BIN_FLAG_CONTROL),
        top.bin_flags("myset"),
    );
    assert!(top.is_ldt_record());

    Ok(())
}

#[test]
fn bad_settings_spec_is_refused() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    assert!(matches!(
        Lset::new(&mut top, &mut host, "myset")?.create(Some(&Value::from(7))),
        Err(Error::InputParam(_)),
    ));

    Ok(())
}
