use dorkscope::api::models::{RecentSearch, SearchId};
use dorkscope::data_models::{ResultStats, RiskLevel, SearchResult, SearchType, Source};
use dorkscope::render::{
    render_error_panel, render_quick_results, render_recent_searches, render_result_card,
    render_results, render_results_header, source_badge,
};

fn result(title: &str, source: Source, risk: Option<RiskLevel>) -> SearchResult {
    SearchResult {
        risk_level: risk,
        ..SearchResult::new(title, "https://example.com/page", source)
    }
}

mod stats {
    use super::*;

    #[test]
    fn test_risk_counts_never_exceed_total() {
        let results = vec![
            result("a", Source::Google, Some(RiskLevel::High)),
            result("b", Source::Bing, Some(RiskLevel::Medium)),
            result("c", Source::Google, None),
            result("d", Source::DuckDuckGo, Some(RiskLevel::Unclassified)),
            result("e", Source::Google, Some(RiskLevel::Low)),
        ];
        let stats = ResultStats::from_results(&results);

        assert_eq!(stats.total, 5);
        assert_eq!((stats.high_risk, stats.medium_risk, stats.low_risk), (1, 1, 1));
        assert!(stats.classified() < stats.total);
        assert_eq!(
            stats.sources,
            vec![Source::Google, Source::Bing, Source::DuckDuckGo]
        );
    }

    #[test]
    fn test_counts_sum_to_total_when_everything_is_classified() {
        let results = vec![
            result("a", Source::Google, Some(RiskLevel::High)),
            result("b", Source::Google, Some(RiskLevel::Low)),
            result("c", Source::Google, Some(RiskLevel::Low)),
        ];
        let stats = ResultStats::from_results(&results);
        assert_eq!(stats.classified(), stats.total);
    }

    #[test]
    fn test_average_relevance_treats_missing_as_zero() {
        let mut scored = result("a", Source::Google, None);
        scored.relevance_score = Some(0.8);
        let stats = ResultStats::from_results(&[scored, result("b", Source::Google, None)]);
        assert!((stats.avg_relevance - 0.4).abs() < 1e-9);
        assert_eq!(ResultStats::from_results(&[]).avg_relevance, 0.0);
    }
}

mod results {
    use super::*;

    #[test]
    fn test_empty_list_renders_empty_state_without_stats() {
        let html = render_results(&[]);
        assert!(html.contains("empty-results"));
        assert!(html.contains("No results found"));
        assert!(!html.contains("result-stats"));
        assert!(!html.contains("result-card"));
    }

    #[test]
    fn test_stats_block_precedes_cards() {
        let html = render_results(&[
            result("first", Source::Google, Some(RiskLevel::High)),
            result("second", Source::Bing, None),
        ]);
        let stats_at = html.find("result-stats").unwrap();
        let card_at = html.find("result-card").unwrap();
        assert!(stats_at < card_at);
        assert_eq!(html.matches(r#"class="card mb-3 result-card"#).count(), 2);
        assert!(html.contains(r#"data-export="csv""#));
    }

    #[test]
    fn test_server_text_is_escaped() {
        let mut hostile = result("<img src=x onerror=alert(1)>", Source::Google, None);
        hostile.description = Some("<script>steal()</script>".to_string());
        hostile.dork_used = Some(r#"site:"a" & b"#.to_string());
        let html = render_result_card(&hostile, 0);

        assert!(!html.contains("<img src=x"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
        assert!(html.contains("&lt;script&gt;steal()&lt;/script&gt;"));
        assert!(html.contains("site:&quot;a&quot; &amp; b"));
    }

    #[test]
    fn test_link_opens_in_new_tab_and_rejects_non_http() {
        let mut card = result("t", Source::Google, None);
        card.url = Some("javascript:alert(1)".to_string());
        let html = render_result_card(&card, 3);

        assert!(html.contains(r##"href="#""##));
        assert!(html.contains(r#"target="_blank" rel="noopener noreferrer""#));
        assert!(html.contains(r#"data-action="share" data-index="3""#));
        // the raw url is still shown as text
        assert!(html.contains("javascript:alert(1)"));
    }

    #[test]
    fn test_missing_title_and_risk_fall_back() {
        let card = SearchResult {
            title: None,
            ..result("", Source::Google, None)
        };
        let html = render_result_card(&card, 0);
        assert!(html.contains("Untitled"));
        assert!(html.contains("Unclassified"));
        assert!(!html.contains("high-risk"));
    }

    #[test]
    fn test_risk_styling() {
        let html = render_result_card(&result("t", Source::Google, Some(RiskLevel::High)), 0);
        assert!(html.contains("result-card high-risk"));
        assert!(html.contains("High Risk"));
    }

    #[test]
    fn test_relevance_shown_as_percentage_with_one_decimal() {
        let mut card = result("t", Source::Google, None);
        card.relevance_score = Some(0.875);
        assert!(render_result_card(&card, 0).contains("87.5%"));

        card.relevance_score = Some(0.0);
        assert!(!render_result_card(&card, 0).contains("Relevance"));
    }

    #[test]
    fn test_unknown_source_badge_is_escaped() {
        let badge = source_badge(&Source::Other("<b>leak</b>".to_string()));
        assert!(badge.contains("&lt;b&gt;leak&lt;/b&gt;"));
        assert!(source_badge(&Source::GoogleDork).contains("Google Dork"));
    }

    #[test]
    fn test_header_shows_query_type_and_id() {
        let html = render_results_header("<q>", "domain", 3, Some("42"));
        assert!(html.contains("&lt;q&gt;"));
        assert!(html.contains("Type: domain"));
        assert!(html.contains("3 results"));
        assert!(html.contains("ID: 42"));
        assert!(!render_results_header("q", "ip", 0, None).contains("ID:"));
    }

    #[test]
    fn test_error_panel_escapes_message() {
        let html = render_error_panel("<b>boom</b>");
        assert!(html.contains("search-error"));
        assert!(html.contains("&lt;b&gt;boom&lt;/b&gt;"));
    }
}

mod quick {
    use super::*;

    fn many(n: usize) -> Vec<SearchResult> {
        (0..n)
            .map(|i| result(&format!("result {i}"), Source::Google, None))
            .collect()
    }

    #[test]
    fn test_preview_is_capped_with_view_all_link() {
        let html = render_quick_results(&many(8), "john doe & co");
        assert_eq!(html.matches("quick-result-item").count(), 5);
        assert!(html.contains("result 4"));
        assert!(!html.contains("result 5"));
        assert!(html.contains("/search?query=john+doe+%26+co"));
        assert!(html.contains("View all results (8)"));
    }

    #[test]
    fn test_no_link_when_everything_fits() {
        let html = render_quick_results(&many(5), "q");
        assert_eq!(html.matches("quick-result-item").count(), 5);
        assert!(!html.contains("View all results"));
    }

    #[test]
    fn test_long_descriptions_are_truncated() {
        let mut long = result("t", Source::Bing, None);
        long.description = Some("x".repeat(150));
        let html = render_quick_results(&[long], "q");
        assert!(html.contains(&format!("{}...", "x".repeat(100))));
        assert!(!html.contains(&"x".repeat(101)));
    }

    #[test]
    fn test_blank_titles_read_untitled_like_full_cards() {
        let blank = result("   ", Source::Google, None);
        let missing = SearchResult {
            title: None,
            ..result("", Source::Google, None)
        };
        let html = render_quick_results(&[blank.clone(), missing], "q");
        assert_eq!(html.matches(">Untitled</a>").count(), 2);
        assert!(render_result_card(&blank, 0).contains("Untitled"));
    }

    #[test]
    fn test_empty_preview_says_so() {
        let html = render_quick_results(&[], "q");
        assert!(html.contains("0 results"));
        assert!(html.contains("No results were found"));
    }
}

#[test]
fn test_recent_searches_render_as_history_rows() {
    let rows = render_recent_searches(&[RecentSearch {
        id: Some(SearchId::Number(1)),
        query: "<acme>".to_string(),
        search_type: SearchType::Company,
        timestamp: Some("2024-03-01T10:30:00Z".to_string()),
        results_count: Some(12),
        status: None,
    }]);
    assert!(rows.contains(r#"data-type="company""#));
    assert!(rows.contains(r#"data-status="completed""#));
    assert!(rows.contains("&lt;acme&gt;"));
    assert!(rows.contains("01 Mar 2024, 10:30"));
    assert!(rows.contains("<td>12</td>"));
}
