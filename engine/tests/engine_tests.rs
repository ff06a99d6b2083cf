use engine::{Engine, EngineError, IdfMode, ScopeKind};

fn corpus(engine: &Engine, id: &str) -> String {
    assert!(engine.create_scope(id, ScopeKind::Corpus));
    id.to_string()
}

fn collection(engine: &Engine, id: &str) -> String {
    assert!(engine.create_scope(id, ScopeKind::Collection));
    id.to_string()
}

#[test]
fn lone_document_scores_zero_tfidf() {
    let engine = Engine::default();
    let s1 = corpus(&engine, "s1");
    engine.index_document(&s1, &"d1".into(), "hello world hello").unwrap();

    let scores = engine.document_scores(&"d1".into(), None, 50).unwrap();
    assert_eq!(scores.len(), 2);

    let hello = scores.iter().find(|s| s.term == "hello").unwrap();
    let world = scores.iter().find(|s| s.term == "world").unwrap();
    assert_eq!(hello.frequency, 2);
    assert_eq!(world.frequency, 1);
    assert!((hello.tf - 2.0 / 3.0).abs() < 1e-12);
    assert!((world.tf - 1.0 / 3.0).abs() < 1e-12);
    // N = 1, DF = 1 for both: idf = ln(1/1) = 0, hence tfidf = 0.
    for s in &scores {
        assert_eq!(s.idf, 0.0);
        assert_eq!(s.tfidf, 0.0);
    }
}

#[test]
fn second_document_shifts_idf_for_shared_terms() {
    let engine = Engine::default();
    let s1 = corpus(&engine, "s1");
    engine.index_document(&s1, &"d1".into(), "hello world").unwrap();
    engine.index_document(&s1, &"d2".into(), "hello python").unwrap();

    assert_eq!(engine.document_count(&s1).unwrap(), 2);
    let ln2 = 2.0f64.ln();

    let d1 = engine.document_scores(&"d1".into(), None, 50).unwrap();
    let hello = d1.iter().find(|s| s.term == "hello").unwrap();
    let world = d1.iter().find(|s| s.term == "world").unwrap();
    assert!((hello.idf - 0.0).abs() < 1e-12);
    assert!((world.idf - ln2).abs() < 1e-12);

    let d2 = engine.document_scores(&"d2".into(), None, 50).unwrap();
    let python = d2.iter().find(|s| s.term == "python").unwrap();
    assert!((python.idf - ln2).abs() < 1e-12);
    // The discriminative terms outrank the ubiquitous one.
    assert_eq!(d1[0].term, "world");
    assert_eq!(d2[0].term, "python");
}

#[test]
fn scopes_are_fully_isolated() {
    let engine = Engine::default();
    let a = corpus(&engine, "a");
    let b = corpus(&engine, "b");
    engine.index_document(&a, &"da".into(), "a").unwrap();
    engine.index_document(&b, &"db".into(), "a").unwrap();

    assert_eq!(engine.document_count(&a).unwrap(), 1);
    assert_eq!(engine.document_count(&b).unwrap(), 1);

    let sa = engine.document_scores(&"da".into(), None, 50).unwrap();
    let sb = engine.document_scores(&"db".into(), None, 50).unwrap();
    assert_eq!(sa[0].idf, 0.0);
    assert_eq!(sb[0].idf, 0.0);

    // Growing scope A must not move scope B's values.
    engine.index_document(&a, &"da2".into(), "b c").unwrap();
    let sb_after = engine.document_scores(&"db".into(), None, 50).unwrap();
    assert_eq!(sb, sb_after);
}

#[test]
fn empty_document_still_counts_toward_n() {
    let engine = Engine::default();
    let s1 = corpus(&engine, "s1");
    engine.index_document(&s1, &"d1".into(), "hello").unwrap();
    let indexed = engine.index_document(&s1, &"empty".into(), "").unwrap();
    assert_eq!(indexed, 0);

    assert_eq!(engine.document_count(&s1).unwrap(), 2);
    let scores = engine.document_scores(&"empty".into(), None, 50).unwrap();
    assert!(scores.is_empty());

    // The live N feeds the read path: hello is now in 1 of 2 documents.
    let d1 = engine.document_scores(&"d1".into(), None, 50).unwrap();
    assert!((d1[0].idf - 2.0f64.ln()).abs() < 1e-12);
}

#[test]
fn scope_aggregate_merges_raw_frequencies() {
    let engine = Engine::default();
    let s1 = corpus(&engine, "s1");
    engine.index_document(&s1, &"d1".into(), "a a b").unwrap();
    engine.index_document(&s1, &"d2".into(), "b b c").unwrap();

    let scores = engine.scope_scores(&s1, 50).unwrap();
    assert_eq!(scores.len(), 3);
    let get = |t: &str| scores.iter().find(|s| s.term == t).unwrap();

    // Combined frequencies a:2 b:3 c:1, total 6.
    assert_eq!(get("a").frequency, 2);
    assert_eq!(get("b").frequency, 3);
    assert_eq!(get("c").frequency, 1);
    assert!((get("a").tf - 2.0 / 6.0).abs() < 1e-12);
    assert!((get("b").tf - 3.0 / 6.0).abs() < 1e-12);
    assert!((get("c").tf - 1.0 / 6.0).abs() < 1e-12);

    // DF stays document-level: b in both docs, a and c in one of two.
    let ln2 = 2.0f64.ln();
    assert!((get("b").idf - 0.0).abs() < 1e-12);
    assert!((get("a").idf - ln2).abs() < 1e-12);
    assert!((get("c").idf - ln2).abs() < 1e-12);

    // a (freq 2) outranks c (freq 1) at equal idf; b scores 0.
    let terms: Vec<&str> = scores.iter().map(|s| s.term.as_str()).collect();
    assert_eq!(terms, vec!["a", "c", "b"]);
}

#[test]
fn duplicate_document_id_is_a_noop() {
    let engine = Engine::default();
    let s1 = corpus(&engine, "s1");
    let first = engine.index_document(&s1, &"d1".into(), "hello world").unwrap();
    let second = engine.index_document(&s1, &"d1".into(), "completely different text").unwrap();
    assert_eq!(first, second);
    assert_eq!(engine.document_count(&s1).unwrap(), 1);

    let scores = engine.document_scores(&"d1".into(), None, 50).unwrap();
    assert!(scores.iter().any(|s| s.term == "hello"));
    assert!(!scores.iter().any(|s| s.term == "different"));
}

#[test]
fn unknown_scope_is_reported() {
    let engine = Engine::default();
    let err = engine.index_document(&"missing".into(), &"d1".into(), "text").unwrap_err();
    assert!(matches!(err, EngineError::ScopeNotFound(id) if id == "missing"));

    let err = engine.scope_scores(&"missing".into(), 50).unwrap_err();
    assert!(matches!(err, EngineError::ScopeNotFound(_)));
}

#[test]
fn unknown_document_is_reported() {
    let engine = Engine::default();
    corpus(&engine, "s1");
    let err = engine.document_scores(&"ghost".into(), None, 50).unwrap_err();
    assert!(matches!(err, EngineError::DocumentNotFound(id) if id == "ghost"));
}

#[test]
fn collections_index_existing_documents() {
    let engine = Engine::default();
    let c1 = corpus(&engine, "c1");
    let c2 = corpus(&engine, "c2");
    let shelf = collection(&engine, "shelf");

    engine.index_document(&c1, &"d1".into(), "rust systems").unwrap();
    engine.index_document(&c2, &"d2".into(), "rust web").unwrap();

    engine.add_to_collection(&shelf, &"d1".into()).unwrap();
    engine.add_to_collection(&shelf, &"d2".into()).unwrap();
    // Repeat membership is idempotent.
    engine.add_to_collection(&shelf, &"d1".into()).unwrap();
    assert_eq!(engine.document_count(&shelf).unwrap(), 2);

    // Scored against the collection: rust is in both members.
    let d1 = engine.document_scores(&"d1".into(), Some(&shelf), 50).unwrap();
    let rust = d1.iter().find(|s| s.term == "rust").unwrap();
    assert!((rust.idf - 0.0).abs() < 1e-12);

    // Scored against its owning corpus (one doc): idf 0 everywhere.
    let d1_own = engine.document_scores(&"d1".into(), None, 50).unwrap();
    assert!(d1_own.iter().all(|s| s.idf == 0.0));
}

#[test]
fn scope_kind_is_enforced() {
    let engine = Engine::default();
    let c1 = corpus(&engine, "c1");
    let shelf = collection(&engine, "shelf");
    engine.index_document(&c1, &"d1".into(), "text").unwrap();

    let err = engine.index_document(&shelf, &"d2".into(), "text").unwrap_err();
    assert!(matches!(err, EngineError::WrongScopeKind(..)));

    let err = engine.add_to_collection(&c1, &"d1".into()).unwrap_err();
    assert!(matches!(err, EngineError::WrongScopeKind(..)));
}

#[test]
fn scoring_against_a_foreign_scope_requires_membership() {
    let engine = Engine::default();
    let c1 = corpus(&engine, "c1");
    let shelf = collection(&engine, "shelf");
    engine.index_document(&c1, &"d1".into(), "text").unwrap();

    let err = engine.document_scores(&"d1".into(), Some(&shelf), 50).unwrap_err();
    assert!(matches!(err, EngineError::DocumentNotInScope { .. }));
}

#[test]
fn df_never_decreases_as_documents_arrive() {
    let engine = Engine::default();
    let s1 = corpus(&engine, "s1");
    let texts = ["alpha beta", "beta gamma", "gamma delta", "alpha delta beta"];
    let mut last_df: std::collections::HashMap<String, u32> = Default::default();

    for (i, text) in texts.iter().enumerate() {
        engine.index_document(&s1, &format!("d{i}"), text).unwrap();
        let (scopes, _) = engine.export();
        let df = &scopes["s1"].df;
        for (term, prev) in &last_df {
            assert!(df.get(term).copied().unwrap_or(0) >= *prev);
        }
        last_df = df.clone();
    }
    assert_eq!(last_df["beta"], 3);
    assert_eq!(last_df["alpha"], 2);
}

#[test]
fn stored_postings_match_fresh_recomputation() {
    let engine = Engine::default();
    let s1 = corpus(&engine, "s1");
    engine.index_document(&s1, &"d1".into(), "x y z").unwrap();
    engine.index_document(&s1, &"d2".into(), "x y").unwrap();
    engine.index_document(&s1, &"d3".into(), "x q").unwrap();

    let (scopes, _) = engine.export();
    let state = &scopes["s1"];
    let n = state.document_count();
    for (term, postings) in &state.postings {
        let df = state.df[term];
        let fresh = engine.idf_mode().idf(n, df);
        for p in postings {
            assert!((p.idf - fresh).abs() < 1e-12, "stale idf for {term}");
            assert!((p.tfidf - p.tf * fresh).abs() < 1e-12, "stale tfidf for {term}");
        }
    }
}

#[test]
fn smoothed_mode_never_reaches_zero() {
    let engine = Engine::new(IdfMode::Smoothed);
    let s1 = corpus(&engine, "s1");
    engine.index_document(&s1, &"d1".into(), "common alone").unwrap();
    engine.index_document(&s1, &"d2".into(), "common").unwrap();

    let scores = engine.document_scores(&"d1".into(), None, 50).unwrap();
    let common = scores.iter().find(|s| s.term == "common").unwrap();
    // ln((2+1)/(2+1)) + 1 = 1 for a term in every document.
    assert!((common.idf - 1.0).abs() < 1e-12);
    assert!(scores.iter().all(|s| s.idf > 0.0));
}

#[test]
fn limit_truncates_the_ranking() {
    let engine = Engine::default();
    let s1 = corpus(&engine, "s1");
    engine.index_document(&s1, &"d1".into(), "one two three four five six").unwrap();
    let scores = engine.document_scores(&"d1".into(), None, 3).unwrap();
    assert_eq!(scores.len(), 3);
}

#[test]
fn members_are_reported_in_order() {
    let engine = Engine::default();
    let s1 = corpus(&engine, "s1");
    engine.index_document(&s1, &"b".into(), "x").unwrap();
    engine.index_document(&s1, &"a".into(), "y").unwrap();
    assert_eq!(engine.members(&s1).unwrap(), vec!["a".to_string(), "b".to_string()]);
    assert!(engine.contains_document(&s1, &"a".into()).unwrap());
    assert!(!engine.contains_document(&s1, &"z".into()).unwrap());
}
