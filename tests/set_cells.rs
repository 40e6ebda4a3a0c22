mod common;

use lset::{CellAnchor, Descriptor, Lset, Value};
use test_log::test;

#[test]
fn cells_hold_the_whole_set() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    {
        let mut set = Lset::new(&mut top, &mut host, "nums")?;

        set.create(Some(&common::spec(&[
            ("SetTypeStore", Value::from("ST_SUBRECORD")),
            ("Modulo", Value::from(7)),
            ("Threshold", Value::from(3)),
            ("HashCellMaxList", Value::from(2)),
        ])))?;

        for x in 0..21 {
            set.add(&Value::from(x), None)?;
        }

        assert_eq!(21, set.size()?);

        let expected: Vec<String> = {
            let mut all: Vec<String> = (0..21).map(|x: i64| x.to_string()).collect();
            all.sort();
            all
        };
        assert_eq!(expected, common::canonical_sorted(&set.scan(None)?));
    }

    let desc = Descriptor::from_value(top.bin("nums").expect("descriptor bin"))?;
    let cells = desc.map.hash_directory.as_deref().expect("hash directory");

    assert_eq!(7, cells.len());

    let mut anchored = 0;
    let mut subrecs = 0;

    for cell in cells {
        match cell {
            CellAnchor::Empty => {}
            CellAnchor::List(items) => assert!(items.len() <= 2),
            CellAnchor::Digest { digest, item_count } => {
                // The anchor count mirrors the sub-record's list.
                let sub = host.subrec(digest).expect("durable sub-record");
                assert_eq!(*item_count, sub.list.len() as u64);
                assert!(*item_count > 2);

                assert_eq!(Some(top.digest()), sub.props.parent_digest);
                assert_eq!(desc.props.esr_digest, sub.props.esr_digest);

                subrecs += 1;
            }
            CellAnchor::Tree(_) => panic!("tree cells are never written"),
        }

        anchored += cell.item_count();
    }

    assert_eq!(21, anchored);
    assert_eq!(21, desc.props.item_count);

    // Data sub-records plus the existence sub-record.
    assert_eq!(subrecs + 1, desc.props.subrec_count);
    assert_eq!(desc.props.subrec_count as usize, host.subrec_count());

    Ok(())
}

#[test]
fn a_full_cell_promotes_to_a_sub_record() -> lset::Result<()> {
    let mut host = common::host();
    let mut top = host.fresh_record();

    {
        let mut set = Lset::new(&mut top, &mut host, "one_cell")?;

        // A single cell makes promotion deterministic.
        set.create(Some(&common::spec(&[
            ("SetTypeStore", Value::from("ST_SUBRECORD")),
            ("Modulo", Value::from(1)),
            ("Threshold", Value::from(2)),
            ("HashCellMaxList", Value::from(2)),
        ])))?;

        set.add(&Value::from("a"), None)?;
        set.add(&Value::from("b"), None)?;

        let desc = Descriptor::from_value(top.bin("one_cell").expect("descriptor bin"))?;
        let cells = desc.map.hash_directory.as_deref().expect("hash directory");
        assert!(matches!(cells[0], CellAnchor::List(ref items) if items.len() == 2));
    }

    {
        let mut set = Lset::new(&mut top, &mut host, "one_cell")?;

        // The third member exceeds the cell allowance.
        set.add(&Value::from("c"), None)?;

        assert_eq!(
            vec!["\"a\"", "\"b\"", "\"c\""],
            common::canonical_sorted(&set.scan(None)?),
        );
        assert_eq!(3, set.size()?);
    }

    let desc = Descriptor::from_value(top.bin("one_cell").expect("descriptor bin"))?;
    let cells = desc.map.hash_directory.as_deref().expect("hash directory");

    assert!(matches!(
        cells[0],
        CellAnchor::Digest { item_count: 3, .. },
    ));

    Ok(())
}
