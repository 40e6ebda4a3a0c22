mod common;

use lset::{CellAnchor, Descriptor, Error, Lset, Value};
use test_log::test;

#[test]
fn removed_members_can_come_back() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    let mut set = Lset::new(&mut top, &mut host, "myset")?;

    for name in ["a", "b", "c"] {
        set.add(&Value::from(name), None)?;
    }

    let removed = set.remove(&Value::from("b"), None, true)?;
    assert_eq!(Some(Value::from("b")), removed);

    assert_eq!(
        vec!["\"a\"", "\"c\""],
        common::canonical_sorted(&set.scan(None)?),
    );

    set.add(&Value::from("b"), None)?;
    assert_eq!(3, set.size()?);
    assert!(set.exists(&Value::from("b"))?);

    Ok(())
}

#[test]
fn removing_a_missing_key_changes_nothing() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    let mut set = Lset::new(&mut top, &mut host, "myset")?;

    set.add(&Value::from("a"), None)?;

    assert!(matches!(
        set.remove(&Value::from("nope"), None, true),
        Err(Error::NotFound),
    ));

    assert_eq!(1, set.size()?);

    Ok(())
}

#[test]
fn removed_value_is_only_returned_on_request() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    let mut set = Lset::new(&mut top, &mut host, "myset")?;

    set.add(&Value::from(1), None)?;
    set.add(&Value::from(2), None)?;

    assert_eq!(None, set.remove(&Value::from(1), None, false)?);
    assert_eq!(Some(Value::from(2)), set.remove(&Value::from(2), None, true)?);

    Ok(())
}

#[test]
fn drained_sub_records_are_kept() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    {
        let mut set = Lset::new(&mut top, &mut host, "one_cell")?;

        set.create(Some(&common::spec(&[
            ("SetTypeStore", Value::from("ST_SUBRECORD")),
            ("Modulo", Value::from(1)),
            ("Threshold", Value::from(2)),
            ("HashCellMaxList", Value::from(2)),
        ])))?;

        // Three members promote the single cell to a sub-record.
        for name in ["a", "b", "c"] {
            set.add(&Value::from(name), None)?;
        }

        for name in ["a", "b", "c"] {
            set.remove(&Value::from(name), None, false)?;
        }

        assert_eq!(0, set.size()?);
    }

    // The drained cell stays anchored to its (now empty) sub-record; the
    // record itself only dies with the existence sub-record.
    let desc = Descriptor::from_value(top.bin("one_cell").expect("descriptor bin"))?;
    let cells = desc.map.hash_directory.as_deref().expect("hash directory");

    let CellAnchor::Digest { digest, item_count } = &cells[0] else {
        panic!("drained cell left Digest state");
    };

    assert_eq!(0, *item_count);
    assert!(host.subrec(digest).is_some_and(|sub| sub.list.is_empty()));

    // And it keeps serving inserts.
    let mut set = Lset::new(&mut top, &mut host, "one_cell")?;
    set.add(&Value::from("d"), None)?;
    assert!(set.exists(&Value::from("d"))?);

    Ok(())
}
