use lexoscope::clusters::assemble;

fn toks(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn assigns_sequential_ids_in_ascending_exemplar_order() {
    let tokens = toks(&["a", "b", "c", "d"]);
    let record = assemble(&tokens, &[0, 0, 3, 3]);
    assert_eq!(record.len(), 2);
    assert_eq!(record[&0].centroid, "a");
    assert_eq!(record[&0].members, toks(&["a", "b"]));
    assert_eq!(record[&1].centroid, "d");
    assert_eq!(record[&1].members, toks(&["c", "d"]));
}

#[test]
fn members_keep_ascending_original_token_order() {
    let tokens = toks(&["e", "d", "c", "b", "a"]);
    let record = assemble(&tokens, &[2, 2, 2, 2, 2]);
    assert_eq!(record[&0].members, toks(&["e", "d", "c", "b", "a"]));
    assert_eq!(record[&0].centroid, "c");
}

#[test]
fn every_index_lands_in_exactly_one_cluster() {
    let tokens = toks(&["a", "b", "c", "d", "e", "f"]);
    let assignment = [0, 0, 2, 2, 4, 4];
    let record = assemble(&tokens, &assignment);
    let mut seen: Vec<String> = record.values().flat_map(|c| c.members.clone()).collect();
    assert_eq!(seen.len(), tokens.len());
    seen.sort();
    let mut expected = tokens.clone();
    expected.sort();
    assert_eq!(seen, expected);
}

#[test]
fn centroid_is_always_one_of_its_own_members() {
    let tokens = toks(&["a", "b", "c", "d"]);
    let record = assemble(&tokens, &[1, 1, 1, 3]);
    for cluster in record.values() {
        assert!(cluster.members.contains(&cluster.centroid));
    }
}

#[test]
fn duplicate_tokens_survive_per_occurrence() {
    let tokens = toks(&["chat", "chat", "chien"]);
    let record = assemble(&tokens, &[0, 0, 2]);
    assert_eq!(record[&0].members, toks(&["chat", "chat"]));
    assert_eq!(record[&1].members, toks(&["chien"]));
}
