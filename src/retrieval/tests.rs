use super::*;
use std::sync::Arc;
use std::time::Duration;

use crate::corpus::{CorpusError, CorpusResult, CorpusStore, FaqRecord, LexicalRow, MockCorpusStore, NewFaq};
use crate::embedding::{EmbeddingBackend, HashedEmbedder, MockEmbedder};

fn wonk_corpus() -> MockCorpusStore {
    MockCorpusStore::with_faqs(&[
        ("What is Wonk?", "Wonk is a local FAQ chatbot."),
        ("什么是 Wonk？", "Wonk 是一个本地运行的FAQ聊天机器人。"),
    ])
}

fn support_corpus() -> MockCorpusStore {
    MockCorpusStore::with_faqs(&[
        ("What is Wonk?", "Wonk is a local FAQ chatbot."),
        ("How do I reset my password?", "Use the reset link on the login page."),
        ("Where are invoices stored?", "Invoices live under Billing > History."),
    ])
}

fn hashed_backend() -> EmbeddingBackend {
    EmbeddingBackend::Hashed(HashedEmbedder::new(256).unwrap())
}

fn lexical_only(store: MockCorpusStore, fuzzy: bool) -> QueryOrchestrator<MockCorpusStore> {
    QueryOrchestrator::new(
        Arc::new(store),
        EmbeddingBackend::unavailable("disabled in test"),
        FuzzyMatcher::new(fuzzy),
    )
}

fn ids(candidates: &[ScoredCandidate]) -> Vec<i64> {
    candidates.iter().map(|c| c.id).collect()
}

mod fusion_tests {
    use super::*;

    fn lex(pairs: &[(i64, f32)]) -> Vec<ScoredCandidate> {
        pairs.iter().map(|&(id, s)| ScoredCandidate::new(id, s)).collect()
    }

    #[test]
    fn test_both_empty() {
        assert!(fuse(&[], &ScoreMap::new(), 0.5).is_empty());
    }

    #[test]
    fn test_degenerate_normalization_is_flat() {
        for alpha in [0.0f32, 0.25, 0.5, 1.0] {
            let fused = fuse(&lex(&[(7, -2.5)]), &ScoreMap::new(), alpha);
            assert_eq!(fused.len(), 1);
            assert!((fused[0].score - 0.3 * (1.0 - alpha)).abs() < 1e-6);
        }

        // substring hits all carry 0.0
        let flat = normalize_lexical(&lex(&[(1, 0.0), (2, 0.0), (3, 0.0)]));
        assert_eq!(flat.get(1), 0.3);
        assert_eq!(flat.get(3), 0.3);
    }

    #[test]
    fn test_normalization_range() {
        let sims = normalize_lexical(&lex(&[(1, -8.0), (2, -4.0), (3, -2.0)]));
        assert!((sims.get(1) - 0.9).abs() < 1e-6);
        assert!((sims.get(2) - 0.3).abs() < 1e-6);
        assert_eq!(sims.get(3), 0.0);
        assert_eq!(sims.get(99), 0.0);
    }

    #[test]
    fn test_union_with_missing_scores_as_zero() {
        let semantic: ScoreMap = [(2, 0.8), (5, 0.6)].into_iter().collect();
        let fused = fuse(&lex(&[(1, -3.0), (2, -1.0)]), &semantic, 0.5);

        assert_eq!(ids(&fused), vec![1, 2, 5]);
        assert!((fused[0].score - 0.45).abs() < 1e-6);
        assert!((fused[1].score - 0.4).abs() < 1e-6);
        assert!((fused[2].score - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_ties_break_by_ascending_id() {
        let semantic: ScoreMap = [(9, 0.5), (4, 0.5), (6, 0.5)].into_iter().collect();
        let fused = fuse(&[], &semantic, 1.0);
        assert_eq!(ids(&fused), vec![4, 6, 9]);
    }

    #[test]
    fn test_duplicate_lexical_ids_keep_first() {
        let sims = normalize_lexical(&lex(&[(1, -5.0), (2, -1.0), (1, -1.0)]));
        assert!((sims.get(1) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_fuse_is_idempotent() {
        let lexical = lex(&[(1, -3.0), (2, -2.0), (3, -2.0)]);
        let semantic: ScoreMap = [(3, 0.7), (4, 0.2)].into_iter().collect();
        assert_eq!(fuse(&lexical, &semantic, 0.4), fuse(&lexical, &semantic, 0.4));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Raising alpha never lowers an id whose semantic score beats its
            /// lexical similarity, and never raises one where it does not.
            #[test]
            fn alpha_monotonicity(
                costs in prop::collection::vec(-20.0f32..0.0, 0..8),
                sems in prop::collection::vec(0.0f32..1.0, 0..8),
                a in 0.0f32..1.0,
                b in 0.0f32..1.0,
            ) {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                let lexical: Vec<ScoredCandidate> = costs
                    .iter()
                    .enumerate()
                    .map(|(i, &c)| ScoredCandidate::new(i as i64, c))
                    .collect();
                let semantic: ScoreMap = sems
                    .iter()
                    .enumerate()
                    .map(|(i, &s)| (i as i64 * 2, s))
                    .collect();
                let lexical_sim = normalize_lexical(&lexical);

                let low = ScoreMap::from_iter(fuse(&lexical, &semantic, lo));
                let high = ScoreMap::from_iter(fuse(&lexical, &semantic, hi));

                for id in low.ids() {
                    let (s, l) = (semantic.get(id), lexical_sim.get(id));
                    if s >= l {
                        prop_assert!(high.get(id) >= low.get(id) - 1e-5);
                    } else {
                        prop_assert!(high.get(id) <= low.get(id) + 1e-5);
                    }
                }
            }

            #[test]
            fn fused_scores_are_sorted_and_bounded(
                costs in prop::collection::vec(-20.0f32..0.0, 0..8),
                sems in prop::collection::vec(0.0f32..1.0, 0..8),
                alpha in 0.0f32..=1.0,
            ) {
                let lexical: Vec<ScoredCandidate> = costs
                    .iter()
                    .enumerate()
                    .map(|(i, &c)| ScoredCandidate::new(i as i64, c))
                    .collect();
                let semantic: ScoreMap = sems
                    .iter()
                    .enumerate()
                    .map(|(i, &s)| (i as i64, s))
                    .collect();

                let fused = fuse(&lexical, &semantic, alpha);
                for pair in fused.windows(2) {
                    prop_assert!(pair[0].score > pair[1].score
                        || (pair[0].score == pair[1].score && pair[0].id < pair[1].id));
                }
                for c in &fused {
                    prop_assert!(c.score >= -1e-6 && c.score <= 1.0 + 1e-6);
                }
            }
        }
    }
}

mod confidence_tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(classify(0.8, 0.8, 0.5), ConfidenceTier::High);
        assert_eq!(classify(0.79999, 0.8, 0.5), ConfidenceTier::Mid);
        assert_eq!(classify(0.5, 0.8, 0.5), ConfidenceTier::Mid);
        assert_eq!(classify(0.49, 0.8, 0.5), ConfidenceTier::Low);
        assert_eq!(classify(0.0, 0.8, 0.5), ConfidenceTier::Low);
    }

    #[test]
    fn test_no_candidate_is_none() {
        assert_eq!(classify_top(None, 0.8, 0.5), (ConfidenceTier::None, 0.0));
        assert_eq!(classify_top(Some(0.9), 0.8, 0.5), (ConfidenceTier::High, 0.9));
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ConfidenceTier::Mid).unwrap(), "\"mid\"");
        assert_eq!(ConfidenceTier::None.to_string(), "none");
        assert!(ConfidenceTier::High.is_confident());
        assert!(!ConfidenceTier::Low.is_confident());
    }
}

mod fuzzy_tests {
    use super::*;

    fn record(id: i64, question: &str, answer: &str) -> FaqRecord {
        NewFaq::new(question, answer).into_record(id)
    }

    #[test]
    fn test_token_set_ratio_basics() {
        assert_eq!(token_set_ratio("reset password", "Password RESET"), 1.0);
        assert_eq!(token_set_ratio("reset", "how do I reset my password"), 1.0);
        assert_eq!(token_set_ratio("", "anything"), 0.0);
        assert_eq!(token_set_ratio("?!", "anything"), 0.0);

        let near = token_set_ratio("pasword", "password");
        let far = token_set_ratio("pasword", "invoices");
        assert!(near > far);
        assert!(near > 0.8);
    }

    #[test]
    fn test_token_set_ratio_uses_levenshtein_distance() {
        // 3 edits over the longer length of 7; an InDel ratio would give 1 - 5/13
        let score = token_set_ratio("kitten", "sitting");
        assert!((score - (1.0 - 3.0 / 7.0)).abs() < 1e-6, "score was {score}");

        let swapped = token_set_ratio("ab", "ac");
        assert!((swapped - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rank_prefers_best_field_and_truncates() {
        let records = vec![
            record(1, "What is Wonk?", "Wonk is a local FAQ chatbot."),
            record(2, "How do I reset my password?", "Use the reset link."),
            record(3, "Where are invoices stored?", "Under Billing."),
        ];

        let ranked = FuzzyMatcher::default().rank("pasword resett", &records, 1);
        assert_eq!(ids(&ranked), vec![2]);

        let ranked = FuzzyMatcher::default().rank("chatbot locally", &records, 5);
        assert_eq!(ranked[0].id, 1);
        assert!(ranked.iter().all(|c| c.score > 0.0));
    }

    #[test]
    fn test_disabled_matcher_returns_nothing() {
        let records = vec![record(1, "q", "a")];
        assert!(FuzzyMatcher::disabled().rank("q", &records, 5).is_empty());
        assert!(FuzzyMatcher::default().rank("   ", &records, 5).is_empty());
    }
}

mod lexical_tests {
    use super::*;
    use crate::retrieval::lexical;

    #[test]
    fn test_match_expression() {
        assert_eq!(
            fts_match_expression("What is Wonk? what IS").as_deref(),
            Some("\"what\" OR \"is\" OR \"wonk\"")
        );
        assert_eq!(
            fts_match_expression("什么是 Wonk？").as_deref(),
            Some("\"什么是\" OR \"wonk\"")
        );
        assert_eq!(fts_match_expression("\"*) OR (").as_deref(), Some("\"or\""));
        assert!(fts_match_expression("?!...").is_none());
    }

    #[tokio::test]
    async fn test_blank_query_is_empty() {
        let store = support_corpus();
        assert!(lexical::search(&store, "   ", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_text_hits_best_first() {
        let store = support_corpus();
        let rows = lexical::search(&store, "reset my password", 0).await.unwrap();
        assert_eq!(rows.len(), 1, "top_k 0 is raised to 1");
        assert_eq!(rows[0].id, 2);
    }

    #[tokio::test]
    async fn test_falls_back_when_index_unavailable() {
        let store = support_corpus();
        store.set_full_text_available(false);

        let rows = lexical::search(&store, "invoices", 5).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3]);
        assert!(rows.iter().all(|r| r.raw_score == 0.0));
    }

    #[tokio::test]
    async fn test_falls_back_when_full_text_is_empty() {
        let store = support_corpus();
        // no whole-token hit, but a substring of "Billing > History."
        let rows = lexical::search(&store, "ing > Hist", 5).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3]);
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let store = support_corpus();
        store.set_unreachable(true);
        assert!(matches!(
            lexical::search(&store, "wonk", 5).await,
            Err(CorpusError::Unreachable { .. })
        ));
    }
}

mod semantic_tests {
    use super::*;

    #[test]
    fn test_cache_normalizes_and_handles_zero_vectors() {
        let cache = SemanticCache::from_vectors(
            vec![1, 2, 3],
            vec![vec![3.0, 4.0], vec![0.0, 0.0], vec![0.0, 2.0]],
        )
        .unwrap();
        assert_eq!(cache.dimension(), 2);

        let hits = cache.search(&[0.0, 10.0], 10);
        assert_eq!(ids(&hits), vec![3, 1, 2]);
        assert!((hits[0].score - 1.0).abs() < 1e-3);
        assert!((hits[1].score - 0.8).abs() < 1e-3);
        assert_eq!(hits[2].score, 0.0);

        let hits = cache.search(&[0.0, 0.0], 10);
        assert!(hits.iter().all(|h| h.score == 0.0));
        assert_eq!(ids(&hits), vec![1, 2, 3], "ties keep corpus order");
    }

    #[test]
    fn test_cache_rejects_ragged_vectors() {
        let err = SemanticCache::from_vectors(vec![1, 2], vec![vec![1.0], vec![1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, crate::embedding::EmbeddingError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_unavailable_backend_gives_no_signal() {
        let store = support_corpus();
        let index = SemanticIndex::new(EmbeddingBackend::unavailable("off"));

        assert!(index.query(&store, "wonk", 5).await.unwrap().is_none());
        assert_eq!(store.full_scan_count(), 0);
        assert!(!index.is_built());
    }

    #[tokio::test]
    async fn test_lazy_build_on_first_query() {
        let store = support_corpus();
        let index = SemanticIndex::new(hashed_backend());
        assert!(!index.is_built());

        let hits = index.query(&store, "reset my password", 2).await.unwrap().unwrap();
        assert!(index.is_built());
        assert_eq!(index.generation(), 1);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 2);

        index.query(&store, "invoices", 2).await.unwrap();
        assert_eq!(index.generation(), 1, "fresh cache is reused");
        assert_eq!(store.full_scan_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_corpus_is_empty_signal() {
        let store = MockCorpusStore::new();
        let index = SemanticIndex::new(hashed_backend());

        let hits = index.query(&store, "anything", 5).await.unwrap();
        assert_eq!(hits, Some(vec![]));
    }

    #[tokio::test]
    async fn test_count_drift_marks_stale_and_rebuild_sees_new_record() {
        let store = support_corpus();
        let index = SemanticIndex::new(hashed_backend());
        index.build_from_corpus(&store).await.unwrap();
        assert!(!index.observe_corpus_count(3));
        assert!(!index.is_stale());

        let new_id = store.insert(NewFaq::new(
            "Do you support single sign-on?",
            "Yes, SAML and OIDC single sign-on are supported.",
        ));
        assert!(index.observe_corpus_count(store.len()));
        assert!(index.is_stale());

        let hits = index
            .query(&store, "single sign-on support", 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hits[0].id, new_id);
        assert!(!index.is_stale());
        assert_eq!(index.generation(), 2);
        assert_eq!(index.snapshot().len(), 4);
    }

    #[tokio::test]
    async fn test_invalidate_forces_rebuild() {
        let store = support_corpus();
        let index = SemanticIndex::new(hashed_backend());
        index.build_from_corpus(&store).await.unwrap();

        index.invalidate();
        assert!(index.is_stale());
        index.query(&store, "wonk", 1).await.unwrap();
        assert_eq!(index.generation(), 2);
        assert_eq!(store.full_scan_count(), 2);
    }

    #[tokio::test]
    async fn test_build_failure_leaves_index_unbuilt_and_retries() {
        let store = support_corpus();
        let mock = MockEmbedder::new(32);
        let index = SemanticIndex::new(EmbeddingBackend::Mock(mock.clone()));

        mock.set_failing(true);
        assert!(index.query(&store, "wonk", 3).await.unwrap().is_none());
        assert!(!index.is_built());
        assert!(index.snapshot().is_empty());

        mock.set_failing(false);
        let hits = index.query(&store, "wonk", 3).await.unwrap();
        assert!(hits.is_some_and(|h| !h.is_empty()));
        assert!(index.is_built());
    }

    #[tokio::test]
    async fn test_query_encoding_failure_gives_no_signal() {
        let store = support_corpus();
        let mock = MockEmbedder::new(32);
        let index = SemanticIndex::new(EmbeddingBackend::Mock(mock.clone()));
        index.build_from_corpus(&store).await.unwrap();

        mock.set_failing(true);
        assert!(index.query(&store, "wonk", 3).await.unwrap().is_none());
        assert!(index.is_built(), "a failed query does not drop the cache");
    }

    #[tokio::test]
    async fn test_dimension_mismatch_gives_no_signal() {
        let store = support_corpus();
        let mock = MockEmbedder::new(32);
        let index = SemanticIndex::new(EmbeddingBackend::Mock(mock.clone()));
        index.build_from_corpus(&store).await.unwrap();

        mock.set_output_dimension(16);
        assert!(index.query(&store, "wonk", 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corpus_errors_propagate_from_build() {
        let store = support_corpus();
        store.set_unreachable(true);
        let index = SemanticIndex::new(hashed_backend());
        assert!(matches!(
            index.query(&store, "wonk", 3).await,
            Err(CorpusError::Unreachable { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_queries_share_one_rebuild() {
        let store = Arc::new(support_corpus());
        let mock = MockEmbedder::new(32);
        let index = Arc::new(SemanticIndex::new(EmbeddingBackend::Mock(mock.clone())));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let index = Arc::clone(&index);
                tokio::spawn(async move { index.query(store.as_ref(), "wonk", 2).await })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap().unwrap().is_some());
        }

        assert_eq!(index.generation(), 1);
        assert_eq!(store.full_scan_count(), 1);
        // one build batch plus one encode per query
        assert_eq!(mock.encode_calls(), 1 + 8);
    }
}

mod orchestrator_tests {
    use super::*;

    /// Delegates to a mock store after a delay on `count`.
    struct SlowCorpus {
        inner: MockCorpusStore,
        delay: Duration,
    }

    impl CorpusStore for SlowCorpus {
        async fn lexical_raw_search(&self, match_expr: &str, limit: usize) -> CorpusResult<Vec<LexicalRow>> {
            self.inner.lexical_raw_search(match_expr, limit).await
        }

        async fn substring_search(&self, needle: &str, limit: usize) -> CorpusResult<Vec<LexicalRow>> {
            self.inner.substring_search(needle, limit).await
        }

        async fn full_scan(&self) -> CorpusResult<Vec<FaqRecord>> {
            self.inner.full_scan().await
        }

        async fn count(&self) -> CorpusResult<usize> {
            tokio::time::sleep(self.delay).await;
            self.inner.count().await
        }
    }

    #[tokio::test]
    async fn test_single_record_corpus_lexical_only_is_low() {
        let store = MockCorpusStore::with_faqs(&[("What is Wonk?", "Wonk is a local FAQ chatbot.")]);
        let orchestrator = lexical_only(store, true);

        let answer = orchestrator
            .answer("What is Wonk?", &RetrievalParams::default())
            .await
            .unwrap();

        // one lexical row normalizes to the flat 0.3, below the 0.5 mid bound
        assert_eq!(answer.best().unwrap().id, 1);
        assert!((answer.top_score - 0.3).abs() < 1e-6);
        assert_eq!(answer.tier, ConfidenceTier::Low);

        let lenient = RetrievalParams {
            low: 0.3,
            ..RetrievalParams::default()
        };
        let answer = orchestrator.answer("What is Wonk?", &lenient).await.unwrap();
        assert_eq!(answer.tier, ConfidenceTier::Mid);
    }

    #[tokio::test]
    async fn test_wonk_scenario_lexical_only_two_records() {
        let orchestrator = lexical_only(wonk_corpus(), true);

        let answer = orchestrator
            .answer("What is Wonk?", &RetrievalParams::default())
            .await
            .unwrap();

        assert_eq!(answer.path, AnswerPath::Fused);
        assert_eq!(answer.best().unwrap().id, 1);
        assert_eq!(answer.best().unwrap().answer, "Wonk is a local FAQ chatbot.");
        assert!(answer.tier.is_confident(), "tier was {}", answer.tier);
        assert!((answer.top_score - 0.9).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_empty_corpus_unavailable_semantic_no_fuzzy() {
        let orchestrator = lexical_only(MockCorpusStore::new(), false);

        let answer = orchestrator
            .answer("anything at all", &RetrievalParams::default())
            .await
            .unwrap();

        assert_eq!(answer, QueryAnswer::empty());
        assert_eq!(answer.tier, ConfidenceTier::None);
        assert_eq!(answer.top_score, 0.0);
    }

    #[tokio::test]
    async fn test_empty_corpus_with_every_tier_on() {
        let orchestrator = QueryOrchestrator::new(
            Arc::new(MockCorpusStore::new()),
            hashed_backend(),
            FuzzyMatcher::default(),
        );

        let answer = orchestrator
            .answer("anything", &RetrievalParams::default())
            .await
            .unwrap();
        assert!(answer.is_empty());
        assert_eq!(answer.tier, ConfidenceTier::None);
    }

    #[tokio::test]
    async fn test_blank_query_touches_nothing() {
        let store = support_corpus();
        store.set_unreachable(true);
        let orchestrator = lexical_only(store, true);

        let answer = orchestrator.answer("  \n ", &RetrievalParams::default()).await.unwrap();
        assert_eq!(answer, QueryAnswer::empty());
    }

    #[tokio::test]
    async fn test_fuzzy_fallback_path() {
        let orchestrator = lexical_only(support_corpus(), true);

        let answer = orchestrator
            .answer("pasword resett", &RetrievalParams::default())
            .await
            .unwrap();

        assert_eq!(answer.path, AnswerPath::Fuzzy);
        assert_eq!(answer.best().unwrap().id, 2);
        assert!(answer.top_score > 0.0);
        assert_eq!(orchestrator.corpus().full_scan_count(), 1);
    }

    #[tokio::test]
    async fn test_fuzzy_disabled_skips_scan() {
        let orchestrator = lexical_only(support_corpus(), false);

        let answer = orchestrator
            .answer("pasword resett", &RetrievalParams::default())
            .await
            .unwrap();

        assert!(answer.is_empty());
        assert_eq!(orchestrator.corpus().full_scan_count(), 0);
    }

    #[tokio::test]
    async fn test_semantic_only_hits_are_resolved_by_scan() {
        let store = support_corpus();
        store.set_full_text_available(false);
        let orchestrator = QueryOrchestrator::new(Arc::new(store), hashed_backend(), FuzzyMatcher::disabled());

        let answer = orchestrator
            .answer("password reset link", &RetrievalParams::default().with_top_k(2))
            .await
            .unwrap();

        assert_eq!(answer.path, AnswerPath::Fused);
        assert_eq!(answer.candidates.len(), 2);
        assert_eq!(answer.best().unwrap().id, 2);
        assert_eq!(answer.best().unwrap().question, "How do I reset my password?");
        // one scan to build the index, one to resolve semantic-only ids
        assert_eq!(orchestrator.corpus().full_scan_count(), 2);
    }

    #[tokio::test]
    async fn test_configured_alpha_applies_when_semantic_runs() {
        let orchestrator = QueryOrchestrator::new(
            Arc::new(wonk_corpus()),
            hashed_backend(),
            FuzzyMatcher::default(),
        );

        let params = RetrievalParams::default().with_alpha(0.5);
        let answer = orchestrator.answer("What is Wonk?", &params).await.unwrap();

        // lexical part is capped at 0.9, so a semantic weight of 0.5 keeps the
        // fused score strictly below 1.0 and at least half the lexical cap
        assert_eq!(answer.best().unwrap().id, 1);
        assert!(answer.top_score >= 0.45 && answer.top_score < 1.0);
    }

    #[tokio::test]
    async fn test_top_k_truncates() {
        let orchestrator = QueryOrchestrator::new(
            Arc::new(support_corpus()),
            hashed_backend(),
            FuzzyMatcher::default(),
        );

        let answer = orchestrator
            .answer("wonk password invoices", &RetrievalParams::default().with_top_k(1))
            .await
            .unwrap();
        assert_eq!(answer.candidates.len(), 1);
    }

    #[tokio::test]
    async fn test_new_record_is_found_after_insert() {
        let orchestrator = QueryOrchestrator::new(
            Arc::new(support_corpus()),
            hashed_backend(),
            FuzzyMatcher::default(),
        );
        let params = RetrievalParams::default();

        orchestrator.answer("wonk", &params).await.unwrap();
        assert_eq!(orchestrator.semantic_index().generation(), 1);

        let id = orchestrator
            .corpus()
            .insert(NewFaq::new("Can I export my data?", "Use Settings > Export."));
        let answer = orchestrator.answer("export data", &params).await.unwrap();

        assert_eq!(orchestrator.semantic_index().generation(), 2);
        assert_eq!(answer.best().unwrap().id, id);
    }

    #[tokio::test]
    async fn test_corpus_failure_is_an_error() {
        let store = support_corpus();
        store.set_unreachable(true);
        let orchestrator = lexical_only(store, true);

        let err = orchestrator
            .answer("wonk", &RetrievalParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Corpus(CorpusError::Unreachable { .. })));
    }

    #[tokio::test]
    async fn test_answer_with_timeout() {
        let slow = SlowCorpus {
            inner: support_corpus(),
            delay: Duration::from_millis(200),
        };
        let orchestrator = QueryOrchestrator::new(
            Arc::new(slow),
            EmbeddingBackend::unavailable("off"),
            FuzzyMatcher::default(),
        );
        let params = RetrievalParams::default();

        let err = orchestrator
            .answer_with_timeout("wonk", &params, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Timeout { .. }));

        let answer = orchestrator
            .answer_with_timeout("wonk", &params, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(answer.best().unwrap().id, 1);
    }

    #[test]
    fn test_answer_serializes_for_callers() {
        let answer = QueryAnswer {
            candidates: vec![RankedResult {
                id: 1,
                question: "q".to_string(),
                answer: "a".to_string(),
                score: 0.9,
            }],
            tier: ConfidenceTier::High,
            top_score: 0.9,
            path: AnswerPath::Fused,
        };

        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["tier"], "high");
        assert_eq!(json["path"], "fused");
        assert_eq!(json["candidates"][0]["id"], 1);
    }
}
