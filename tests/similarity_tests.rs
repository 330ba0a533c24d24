use lexoscope::similarity::SimilarityMatrix;
use lexoscope::vectorizer::{vectorize, NgramConfig};

fn toks(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn cosine_of(items: &[&str]) -> SimilarityMatrix {
    let vectors = vectorize(&toks(items), &NgramConfig::default()).unwrap();
    SimilarityMatrix::cosine(&vectors)
}

#[test]
fn symmetry_is_exact_to_the_bit() {
    let sim = cosine_of(&["chat", "chatte", "chaton", "chien", "voiture"]);
    for i in 0..sim.len() {
        for j in 0..sim.len() {
            assert_eq!(sim.get(i, j).to_bits(), sim.get(j, i).to_bits());
        }
    }
}

#[test]
fn diagonal_is_one_for_nonzero_vectors() {
    let sim = cosine_of(&["chat", "chien"]);
    assert_eq!(sim.get(0, 0), 1.0);
    assert_eq!(sim.get(1, 1), 1.0);
}

#[test]
fn identical_tokens_are_maximally_similar() {
    let sim = cosine_of(&["chat", "chat"]);
    assert!((sim.get(0, 1) - 1.0).abs() < 1e-12);
}

#[test]
fn disjoint_tokens_have_zero_similarity() {
    let sim = cosine_of(&["chien", "voiture"]);
    assert_eq!(sim.get(0, 1), 0.0);
}

#[test]
fn zero_norm_vectors_get_zero_rows_including_the_diagonal() {
    // "a" is below the n-gram range and contributes nothing
    let sim = cosine_of(&["a", "chat", "chien"]);
    for j in 0..sim.len() {
        assert_eq!(sim.get(0, j), 0.0);
        assert_eq!(sim.get(j, 0), 0.0);
    }
}

#[test]
fn values_stay_within_the_cosine_bounds_and_finite() {
    let sim = cosine_of(&["chat", "chatte", "chaton", "chien", "voiture"]);
    for i in 0..sim.len() {
        for j in 0..sim.len() {
            let v = sim.get(i, j);
            assert!(v.is_finite());
            assert!((-1.0..=1.0).contains(&v));
        }
    }
}

#[test]
fn median_excludes_the_diagonal() {
    let sim = SimilarityMatrix::from_rows(vec![
        vec![1.0, 0.1, 0.5],
        vec![0.1, 1.0, 0.3],
        vec![0.5, 0.3, 1.0],
    ])
    .unwrap();
    // off-diagonal values are 0.1, 0.5, 0.3
    assert_eq!(sim.median_off_diagonal(), 0.3);
}

#[test]
fn median_of_an_even_count_averages_the_middle_pair() {
    let sim = SimilarityMatrix::from_rows(vec![vec![1.0, 0.2], vec![0.2, 1.0]]).unwrap();
    assert_eq!(sim.median_off_diagonal(), 0.2);
    let sim4 = SimilarityMatrix::from_rows(vec![
        vec![1.0, 0.1, 0.2, 0.3],
        vec![0.1, 1.0, 0.4, 0.5],
        vec![0.2, 0.4, 1.0, 0.6],
        vec![0.3, 0.5, 0.6, 1.0],
    ])
    .unwrap();
    // sorted: 0.1 0.2 0.3 0.4 0.5 0.6 -> (0.3 + 0.4) / 2
    assert!((sim4.median_off_diagonal() - 0.35).abs() < 1e-12);
}

#[test]
fn from_rows_rejects_non_square_input() {
    assert!(SimilarityMatrix::from_rows(vec![vec![1.0, 0.5]]).is_none());
}

#[test]
fn from_rows_clamps_non_finite_values() {
    let sim = SimilarityMatrix::from_rows(vec![
        vec![1.0, f64::NAN],
        vec![f64::INFINITY, 1.0],
    ])
    .unwrap();
    assert_eq!(sim.get(0, 1), 0.0);
    assert_eq!(sim.get(1, 0), 0.0);
}

#[test]
fn round_trips_through_rows() {
    let sim = cosine_of(&["chat", "chatte", "chien"]);
    let rebuilt = SimilarityMatrix::from_rows(sim.to_rows()).unwrap();
    assert_eq!(sim, rebuilt);
}
