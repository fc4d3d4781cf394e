use crate::index::{BookmarkIndex, IndexBuilder, QueryEngine, QueryOutcome, SearchHit, RESULT_LIMIT};

use super::fixtures::{folder, url, Fixture};

fn build(fixture: &Fixture) -> BookmarkIndex {
    let (settings, cache) = (fixture.settings(), fixture.cache());
    IndexBuilder::new(&fixture.config, &settings, &cache)
        .rebuild(&fixture.sources())
        .unwrap()
}

fn sample_index() -> (Fixture, BookmarkIndex) {
    let mut fixture = Fixture::new();
    fixture.add_profile(
        "Default",
        vec![
            folder("Golang", vec![url("Tour", "https://go.dev/tour")]),
            folder("Go Blog", vec![url("Blog", "https://go.dev/blog")]),
            folder("Recipes", vec![url("Pasta", "https://pasta.example")]),
            folder("Goldfish care", vec![url("Tank", "https://fish.example")]),
        ],
        &[
            ("https://go.dev/tour", &[1, 1, 1]),
            ("https://go.dev/blog", &[1, 1, 1, 1, 1, 1, 1, 1, 1]),
            ("https://pasta.example", &[1]),
            ("https://fish.example", &[0, 0]),
        ],
    );
    let index = build(&fixture);
    (fixture, index)
}

fn results(outcome: QueryOutcome) -> Vec<SearchHit> {
    match outcome {
        QueryOutcome::Results(hits) => hits,
        other => panic!("expected results, got {other:?}"),
    }
}

fn titles(hits: &[SearchHit]) -> Vec<&str> {
    hits.iter().map(|hit| hit.title.as_str()).collect()
}

#[test]
fn test_prefix_matches_rank_by_frequency() {
    let (_fixture, index) = sample_index();

    let hits = results(QueryEngine::new(&index).search("go").unwrap());

    assert_eq!(titles(&hits), vec!["Go Blog", "Golang", "Goldfish care"]);
    assert_eq!(hits[0].frequency, 9);
    assert_eq!(hits[0].url, "https://go.dev/blog");
    assert_eq!(hits[0].url_count, 1);
    assert_eq!(hits[0].profile, "Default");
}

#[test]
fn test_query_ignores_case() {
    let (_fixture, index) = sample_index();
    let engine = QueryEngine::new(&index);

    assert_eq!(engine.search("GO").unwrap(), engine.search("go").unwrap());
    assert_eq!(titles(&results(engine.search("GO BL").unwrap()))[0], "Go Blog");
}

#[test]
fn test_single_char_query_is_prefix_only() {
    let (_fixture, index) = sample_index();
    let engine = QueryEngine::new(&index);

    // "Tank" is only reachable through the content n-grams
    assert_eq!(engine.search("t").unwrap(), QueryOutcome::NoMatches);
    assert_eq!(titles(&results(engine.search("ta").unwrap())), vec!["Goldfish care"]);
}

#[test]
fn test_fuzzy_pass_tolerates_typos() {
    let (_fixture, index) = sample_index();

    let hits = results(QueryEngine::new(&index).search("tanc").unwrap());

    assert_eq!(titles(&hits), vec!["Goldfish care"]);
}

#[test]
fn test_fuzzy_hits_follow_prefix_hits_without_duplicates() {
    let mut fixture = Fixture::new();
    fixture.add_profile(
        "Default",
        vec![
            folder("Recipes", vec![url("Pasta", "https://pasta.example")]),
            folder("Pasta night", vec![url("Menu", "https://menu.example")]),
        ],
        &[("https://pasta.example", &[1, 1, 1, 1])],
    );
    let index = build(&fixture);

    // "Pasta night" matches both passes, "Recipes" only through its leaf title
    let hits = results(QueryEngine::new(&index).search("pasta").unwrap());

    assert_eq!(titles(&hits), vec!["Pasta night", "Recipes"]);
}

#[test]
fn test_empty_query_lists_by_frequency() {
    let (_fixture, index) = sample_index();

    let hits = results(QueryEngine::new(&index).search("").unwrap());

    assert_eq!(titles(&hits), vec!["Go Blog", "Golang", "Recipes", "Goldfish care"]);
}

#[test]
fn test_results_are_capped() {
    let mut fixture = Fixture::new();
    let folders = (0..RESULT_LIMIT + 5)
        .map(|n| folder(&format!("Docs {n}"), vec![url("Page", &format!("https://docs{n}.example"))]))
        .collect();
    fixture.add_profile("Default", folders, &[]);
    let index = build(&fixture);
    let engine = QueryEngine::new(&index);

    assert_eq!(results(engine.search("").unwrap()).len(), RESULT_LIMIT);
    assert_eq!(results(engine.search("docs").unwrap()).len(), RESULT_LIMIT);
}

#[test]
fn test_empty_index_reports_no_bookmarks() {
    let mut fixture = Fixture::new();
    fixture.add_profile("Default", vec![folder("Empty", vec![])], &[]);
    let index = build(&fixture);

    assert_eq!(
        QueryEngine::new(&index).search("go").unwrap(),
        QueryOutcome::NoBookmarks
    );
}

#[test]
fn test_unknown_term_reports_no_matches() {
    let (_fixture, index) = sample_index();

    assert_eq!(
        QueryEngine::new(&index).search("zzzzzz").unwrap(),
        QueryOutcome::NoMatches
    );
}

#[test]
fn test_results_merge_profiles() {
    let mut fixture = Fixture::new();
    fixture.add_profile(
        "Default",
        vec![folder("Go", vec![url("Go", "https://go.dev")])],
        &[("https://go.dev", &[1])],
    );
    fixture.add_profile(
        "Work",
        vec![folder("Go services", vec![url("Deploys", "https://deploy.example")])],
        &[("https://deploy.example", &[1, 1, 1])],
    );
    let index = build(&fixture);

    let hits = results(QueryEngine::new(&index).search("go").unwrap());

    assert_eq!(titles(&hits), vec!["Go services", "Go"]);
    assert_eq!(hits[0].profile, "Work");
    assert_eq!(hits[1].profile, "Default");
}

#[test]
fn test_query_ignores_accents() {
    let mut fixture = Fixture::new();
    fixture.add_profile(
        "Default",
        vec![folder("École", vec![url("Résumé", "https://cv.example")])],
        &[],
    );
    let index = build(&fixture);
    let engine = QueryEngine::new(&index);

    for query in ["éc", "ec", "eco", "ECOLE", "res", "resume"] {
        let hits = results(engine.search(query).unwrap());
        assert_eq!(titles(&hits), vec!["École"], "query {query:?}");
    }
}

#[test]
fn test_equal_frequencies_keep_insertion_order() {
    let mut fixture = Fixture::new();
    let folders = (0..8)
        .map(|n| folder(&format!("Go {n}"), vec![url("Page", &format!("https://go{n}.example"))]))
        .collect();
    fixture.add_profile("Default", folders, &[]);
    let index = build(&fixture);
    let engine = QueryEngine::new(&index);

    let expected: Vec<String> = (0..8).map(|n| format!("Go {n}")).collect();
    for query in ["go", ""] {
        let hits = results(engine.search(query).unwrap());
        assert_eq!(titles(&hits), expected, "query {query:?}");
    }
}
