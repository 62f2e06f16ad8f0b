use std::sync::Arc;

use anyhow::Result;
use dialog_cog::{
    Cog, CogHandle, CogType, CrackingPolicy, CrackingSettings, NoRewrite, PromotionPolicy,
    SharedPolicy, Tuple, UnsortedLeaf,
};
use pretty_assertions::assert_eq;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

fn shuffled(size: u32, seed: u64) -> Vec<u32> {
    let mut keys = (0..size).collect::<Vec<_>>();
    keys.shuffle(&mut StdRng::seed_from_u64(seed));
    keys
}

fn handle(keys: &[u32]) -> CogHandle<u32, String> {
    CogHandle::unsorted(
        keys.iter()
            .map(|key| Tuple::new(*key, format!("value-{key}")))
            .collect(),
    )
}

#[test]
fn splits_an_unsorted_leaf_and_seeks_through_the_branch() -> Result<()> {
    let leaf = match handle(&[5, 2, 8, 1]).get().as_ref() {
        Cog::UnsortedLeaf(leaf) => leaf.clone(),
        other => anyhow::bail!("Expected an unsorted leaf, found {}", other.cog_type()),
    };

    let root = CogHandle::new(leaf.split_cog(5));
    assert_eq!(root.cog_type(), CogType::Branch);

    let found = root.seek(&3, &NoRewrite).map(|tuple| tuple.key);
    assert_eq!(found, Some(5));

    let mut keys = root
        .iterator(&NoRewrite::shared())
        .map(|tuple| tuple.key)
        .collect::<Vec<_>>();
    keys.sort();
    assert_eq!(keys, vec![1, 2, 5, 8]);

    root.verify()?;
    Ok(())
}

#[test]
fn enumerates_concatenated_batches_in_write_order() -> Result<()> {
    let root = handle(&[3, 1]);
    root.append(handle(&[7]).iterator(&NoRewrite::shared()).collect());
    root.append(vec![Tuple::new(0, "zero".into()), Tuple::new(2, "two".into())]);

    let mut iterator = root.iterator(&NoRewrite::shared());
    let keys = iterator.by_ref().map(|tuple| tuple.key).collect::<Vec<_>>();

    assert_eq!(keys, vec![3, 1, 7, 0, 2]);
    assert_eq!(iterator.next(), None);
    assert_eq!(iterator.next(), None);
    assert_eq!(root.size(), 5);
    Ok(())
}

#[test]
fn enumerates_a_sorted_tree_after_promotion() -> Result<()> {
    let keys = shuffled(200, 7);
    let root = handle(&keys);
    let policy: SharedPolicy<u32, String> = Arc::new(PromotionPolicy);

    let enumerated = root
        .iterator(&policy)
        .map(|tuple| tuple.key)
        .collect::<Vec<_>>();

    assert_eq!(enumerated, (0..200).collect::<Vec<_>>());
    assert_eq!(root.cog_type(), CogType::SortedLeaf);
    root.verify()?;
    Ok(())
}

#[test]
fn cracking_answers_seeks_like_a_full_scan() -> Result<()> {
    let keys = shuffled(2048, 42)
        .into_iter()
        .map(|key| key * 2)
        .collect::<Vec<_>>();
    let root = handle(&keys);
    let policy = CrackingPolicy::new(CrackingSettings {
        crack_threshold: 32,
        sort_threshold: 32,
    })?;

    for target in (0..4200).step_by(37) {
        let expected = keys.iter().filter(|key| **key >= target).min().copied();
        let found = root.seek(&target, &policy);

        assert_eq!(found.as_ref().map(|tuple| tuple.key), expected);
        if let Some(tuple) = found {
            assert_eq!(tuple.value, format!("value-{}", tuple.key));
        }
    }

    assert_eq!(root.size(), keys.len());
    root.verify()?;
    Ok(())
}

#[test]
fn cracking_preserves_duplicate_keys() -> Result<()> {
    let keys = [4u32, 9, 4, 1, 9, 9, 3, 4];
    let root = handle(&keys);
    let policy = CrackingPolicy::new(CrackingSettings {
        crack_threshold: 2,
        sort_threshold: 2,
    })?;

    assert_eq!(root.seek(&2, &policy).map(|tuple| tuple.key), Some(3));
    assert_eq!(root.seek(&5, &policy).map(|tuple| tuple.key), Some(9));

    let mut enumerated = root
        .iterator(&NoRewrite::shared())
        .map(|tuple| tuple.key)
        .collect::<Vec<_>>();
    enumerated.sort();

    let mut expected = keys.to_vec();
    expected.sort();
    assert_eq!(enumerated, expected);
    Ok(())
}

#[test]
fn flattens_a_concatenation_into_one_leaf() -> Result<()> {
    let root = handle(&[6, 2]);
    root.append(handle(&[9, 1]).iterator(&NoRewrite::shared()).collect());

    let Cog::Concatenation(concatenation) = root.get().as_ref().clone() else {
        anyhow::bail!("Expected a concatenation");
    };
    let leaf: UnsortedLeaf<u32, String> = concatenation.flatten();

    assert_eq!(
        leaf.tuples()
            .iter()
            .map(|tuple| tuple.key)
            .collect::<Vec<_>>(),
        vec![6, 2, 9, 1]
    );
    Ok(())
}

#[test]
fn renders_a_cracked_tree() -> Result<()> {
    let upper = CogHandle::sorted(vec![
        Tuple::new(5, "five".into()),
        Tuple::new(8, "eight".into()),
    ])?;
    let root = CogHandle::branch(handle(&[2, 1]), 5, upper);

    assert_eq!(
        root.debug_string(0),
        "Branch[sep = 5, 4 elements]\n  UnsortedLeaf[2 elements]\n  SortedLeaf[2 elements]\n"
    );
    Ok(())
}

#[test]
fn survives_a_hundred_thousand_appends() -> Result<()> {
    let root = CogHandle::unsorted(vec![Tuple::new(0u32, ())]);
    for key in 1..100_000u32 {
        root.append(vec![Tuple::new(key, ())]);
    }

    assert_eq!(root.size(), 100_000);

    let mut expected = 0u32;
    for tuple in root.iterator(&NoRewrite::shared()) {
        assert_eq!(tuple.key, expected);
        expected += 1;
    }
    assert_eq!(expected, 100_000);

    root.verify()?;
    assert!(root.debug_string(0).starts_with("Concatenation[100000 elements]\n"));

    drop(root);
    Ok(())
}
