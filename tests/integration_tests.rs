//! Integration tests for the Box Box Box feed aggregator
//!
//! These tests run the full fetch, parse, normalize and merge pipeline
//! against mock feed servers.

mod common {
    use chrono::{DateTime, Duration, Utc};

    /// Build an RSS 2.0 document from `(title, pub_date)` pairs
    pub fn rss(items: &[(&str, Option<DateTime<Utc>>)]) -> String {
        let body: String = items
            .iter()
            .map(|(title, published)| {
                let pub_date = published
                    .map(|dt| format!("<pubDate>{}</pubDate>", dt.to_rfc2822()))
                    .unwrap_or_default();
                format!(
                    "<item><title>{}</title><link>https://example.com/{}</link>\
                     <description>&lt;p&gt;About {}&lt;/p&gt;</description>{}</item>",
                    title, title, title, pub_date
                )
            })
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <rss version="2.0"><channel><title>Test</title><link>https://example.com</link>
            <description>Test</description>{}</channel></rss>"#,
            body
        )
    }

    /// Build a podcast RSS document with `count` episodes, each carrying an itunes:image
    pub fn podcast_rss(count: usize, newest: DateTime<Utc>) -> String {
        let body: String = (0..count)
            .map(|i| {
                let published = newest - Duration::hours(i as i64);
                format!(
                    r#"<item><title>Episode {}</title><link>https://pod.example.com/{}</link>
                    <pubDate>{}</pubDate>
                    <itunes:image href="https://cdn.example.com/ep{}.jpg"/></item>"#,
                    i, i, published.to_rfc2822(), i
                )
            })
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
            <channel><title>Pod</title><link>https://pod.example.com</link>
            <description>Pod</description>
            <itunes:image href="https://cdn.example.com/show.jpg"/>{}</channel></rss>"#,
            body
        )
    }
}

#[cfg(test)]
mod config_integration_tests {
    use box_box_box::config::Config;
    use box_box_box::registry::Registry;

    #[test]
    fn test_load_actual_feeds_config() {
        let config = Config::load("feeds.toml");
        assert!(config.is_ok(), "Failed to load feeds.toml: {:?}", config.err());

        let config = config.unwrap();
        assert!(config.fetch_timeout > 0, "fetch_timeout should be positive");
        assert_eq!(config.feeds.len(), 6);
    }

    #[test]
    fn test_shipped_config_matches_builtin_sources() {
        let config = Config::load("feeds.toml").unwrap();
        let registry = Registry::from_config(&config).unwrap();

        assert_eq!(registry.sources(), Registry::builtin().sources());
    }
}

#[cfg(test)]
mod aggregation_integration_tests {
    use super::common::*;
    use box_box_box::aggregator::{AggregateError, Aggregator};
    use box_box_box::fetcher::Fetcher;
    use box_box_box::registry::{Registry, Source};
    use chrono::{Duration, TimeZone, Utc};
    use std::time::Duration as StdDuration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount(server: &MockServer, route: &str, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(template)
            .mount(server)
            .await;
    }

    fn aggregator(server: &MockServer, sources: &[(&str, &str, bool)]) -> Aggregator {
        let registry = Registry::new(
            sources
                .iter()
                .map(|(name, route, podcast)| {
                    Source::new(*name, format!("{}{}", server.uri(), route), *podcast)
                })
                .collect(),
        )
        .unwrap();
        let fetcher = Fetcher::new(StdDuration::from_millis(500)).unwrap();
        Aggregator::new(registry, fetcher)
    }

    #[tokio::test]
    async fn test_aggregate_all_merges_and_isolates_failures() {
        let server = MockServer::start().await;
        let now = Utc::now();

        mount(
            &server,
            "/news",
            ResponseTemplate::new(200).set_body_string(rss(&[
                ("news-1", Some(now - Duration::minutes(30))),
                ("news-2", Some(now - Duration::days(3))),
                ("news-undated", None),
            ])),
        )
        .await;
        mount(
            &server,
            "/podcast",
            ResponseTemplate::new(200).set_body_string(podcast_rss(12, now - Duration::minutes(5))),
        )
        .await;
        mount(&server, "/broken", ResponseTemplate::new(500)).await;
        mount(
            &server,
            "/slow",
            ResponseTemplate::new(200)
                .set_body_string(rss(&[("slow-1", Some(now))]))
                .set_delay(StdDuration::from_secs(3)),
        )
        .await;
        mount(
            &server,
            "/garbage",
            ResponseTemplate::new(200).set_body_string("<html><body>Not a feed"),
        )
        .await;

        let aggregator = aggregator(
            &server,
            &[
                ("News", "/news", false),
                ("Broken", "/broken", false),
                ("Slow", "/slow", false),
                ("Pod", "/podcast", true),
                ("Garbage", "/garbage", false),
            ],
        );

        let response = aggregator.aggregate_all().await;

        assert!(response.success);
        assert_eq!(response.count, 13);
        assert_eq!(response.entries.len(), 13);

        // Failed sources contribute nothing
        assert!(response
            .entries
            .iter()
            .all(|item| item.source == "News" || item.source == "Pod"));

        // Newest first, undated last
        assert!(response
            .entries
            .windows(2)
            .all(|w| w[0].timestamp >= w[1].timestamp));
        assert_eq!(response.entries[0].title, "Episode 0");
        let last = response.entries.last().unwrap();
        assert_eq!(last.title, "news-undated");
        assert_eq!(last.timestamp, 0);
        assert_eq!(last.time_ago, "Recently");

        let news_1 = response
            .entries
            .iter()
            .find(|item| item.title == "news-1")
            .unwrap();
        assert_eq!(news_1.time_ago, "30 minutes ago");
        assert_eq!(news_1.description, "About news-1");
        assert_eq!(news_1.link, "https://example.com/news-1");
        assert!(!news_1.is_podcast);
        assert_eq!(news_1.artwork_url, None);

        let episode = response
            .entries
            .iter()
            .find(|item| item.title == "Episode 3")
            .unwrap();
        assert!(episode.is_podcast);
        assert_eq!(
            episode.artwork_url.as_deref(),
            Some("https://cdn.example.com/ep3.jpg")
        );
    }

    #[tokio::test]
    async fn test_aggregate_one_keeps_feed_order_and_caps_at_ten() {
        let server = MockServer::start().await;
        let newest = Utc.with_ymd_and_hms(2024, 12, 9, 12, 0, 0).unwrap();

        // Feed order deliberately not chronological
        let mut items: Vec<(String, chrono::DateTime<Utc>)> = (0..12)
            .map(|i| (format!("item-{}", i), newest - Duration::hours(i)))
            .collect();
        items.swap(0, 5);
        let feed_items: Vec<(&str, Option<chrono::DateTime<Utc>>)> = items
            .iter()
            .map(|(title, published)| (title.as_str(), Some(*published)))
            .collect();

        mount(
            &server,
            "/news",
            ResponseTemplate::new(200).set_body_string(rss(&feed_items)),
        )
        .await;

        let aggregator = aggregator(&server, &[("News", "/news", false)]);

        let response = aggregator.aggregate_one("News").await.unwrap();

        assert!(response.success);
        assert_eq!(response.source, "News");
        assert_eq!(response.count, 10);

        let titles: Vec<&str> = response.entries.iter().map(|i| i.title.as_str()).collect();
        let expected: Vec<&str> = items.iter().take(10).map(|(t, _)| t.as_str()).collect();
        assert_eq!(titles, expected);

        assert_eq!(response.entries[0].timestamp, (newest - Duration::hours(5)).timestamp());
    }

    #[tokio::test]
    async fn test_aggregate_one_unknown_source_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(rss(&[])))
            .expect(0)
            .mount(&server)
            .await;

        let aggregator = aggregator(&server, &[("News", "/news", false)]);

        let result = aggregator.aggregate_one("unknown-source").await;

        assert!(matches!(result, Err(AggregateError::SourceNotFound(_))));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_timed_out_source_does_not_block_others() {
        let server = MockServer::start().await;
        let now = Utc::now();

        mount(
            &server,
            "/fast",
            ResponseTemplate::new(200).set_body_string(rss(&[
                ("fast-1", Some(now - Duration::hours(1))),
                ("fast-2", Some(now - Duration::hours(2))),
            ])),
        )
        .await;
        mount(
            &server,
            "/slow",
            ResponseTemplate::new(200)
                .set_body_string(rss(&[("slow-1", Some(now))]))
                .set_delay(StdDuration::from_secs(3)),
        )
        .await;

        let aggregator = aggregator(&server, &[("Slow", "/slow", false), ("Fast", "/fast", false)]);

        let response = aggregator.aggregate_all().await;

        assert!(response.success);
        assert_eq!(response.count, 2);
        assert_eq!(response.entries[0].title, "fast-1");
        assert_eq!(response.entries[0].time_ago, "1 hour ago");
        assert_eq!(response.entries[1].title, "fast-2");
    }

    #[tokio::test]
    async fn test_single_source_failure_is_empty_listing() {
        let server = MockServer::start().await;
        mount(&server, "/broken", ResponseTemplate::new(404)).await;

        let aggregator = aggregator(&server, &[("Broken", "/broken", false)]);

        let response = aggregator.aggregate_one("Broken").await.unwrap();

        assert!(response.success);
        assert_eq!(response.count, 0);
        assert!(response.entries.is_empty());
    }
}
