mod common;

use std::sync::{Arc, Mutex};

use common::ScriptedFetcher;
use filmow_export::pipeline::{ListingKind, apply_season_rules};
use filmow_export::*;
use tokio::time::Duration;

const BASE: &str = "https://filmow.com/";

fn quick_policy() -> FetchPolicy {
    FetchPolicy {
        retry_delay: Duration::from_millis(1),
        cooldown: Duration::from_millis(1),
        ..FetchPolicy::default()
    }
}

fn collector(fetcher: ScriptedFetcher, dates_fallback: bool) -> Collector {
    Collector::new(
        Site::new(BASE).unwrap(),
        Prefetcher::new(Arc::new(fetcher), quick_policy()),
        Arc::new(FilmowParser::new()),
        YearResolver::from_flag(dates_fallback),
    )
    .with_workers(3, 1)
}

fn list_page(hrefs: &[&str], total: usize) -> String {
    let links: String = hrefs
        .iter()
        .map(|href| format!(r#"<a href="{href}" data-movie-pk="9">t</a>"#))
        .collect();
    format!(r#"<div class="list_stats"><p>by someone</p><p><span>{total}</span></p></div>{links}"#)
}

fn entry_page(breadcrumb: &str, title: &str, runtime: &str) -> String {
    format!(
        r#"<li class="active">{breadcrumb}</li>
        <h2 class="movie-original-title">{title}</h2>
        <span class="running_time">{runtime}</span>"#
    )
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl CollectObserver for Recorder {
    fn on_listing_unreachable(&self, url: &str) {
        self.events.lock().unwrap().push(format!("unreachable {url}"));
    }

    fn on_entry(&self, position: usize, total: usize, _url: &str) {
        self.events.lock().unwrap().push(format!("entry {position}/{total}"));
    }

    fn on_fetch_failed(&self, url: &str) {
        self.events.lock().unwrap().push(format!("failed {url}"));
    }

    fn on_category_finished(&self, total: usize) {
        self.events.lock().unwrap().push(format!("finished {total}"));
    }
}

#[cfg(test)]
mod listing_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_pages_scanned_until_repeat() {
        let root = "https://filmow.com/listas/top-l1/";
        let first = list_page(&["/a-t1/", "/b-t2/", "/a-t1/"], 5);
        let second = list_page(&["/c-t3/", "/d-t4/"], 5);
        let fetcher = ScriptedFetcher::new()
            .page(root, &first)
            .page(&format!("{root}?pagina=1"), &first)
            .page(&format!("{root}?pagina=2"), &second)
            // past the end the site keeps serving the last page
            .page(&format!("{root}?pagina=3"), &second)
            .page(&format!("{root}?pagina=4"), &list_page(&["/e-t5/"], 5));
        let collector = collector(fetcher, false);

        let entries = collector
            .listing_entries(root, ListingKind::UserList, None)
            .await;

        let urls: Vec<&str> = entries.iter().map(|entry| entry.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://filmow.com/a-t1/",
                "https://filmow.com/b-t2/",
                "https://filmow.com/c-t3/",
                "https://filmow.com/d-t4/",
            ]
        );
        assert!(entries.iter().all(|entry| entry.title_type.is_none()));
    }

    #[tokio::test]
    async fn test_ratings_follow_entries_with_several_anchors() {
        let root = "https://filmow.com/usuario/x/filmes/ja-vi/";
        let items: String = [("/a-t1/", 80), ("/b-t2/", 60), ("/c-t3/", 40)]
            .iter()
            .map(|(href, percent)| {
                format!(
                    r#"<li><a href="{href}" data-movie-pk="1"><img></a>
                    <a href="{href}" data-movie-pk="1">title</a>
                    <div class="user-rating"><div class="average" style="width: {percent}.0%;"></div></div></li>"#
                )
            })
            .collect();
        let page = format!("<ul>{items}</ul>");
        let fetcher = ScriptedFetcher::new()
            .page(root, &page)
            .page(&format!("{root}?pagina=1"), &page);
        let collector = collector(fetcher, false);

        let entries = collector
            .listing_entries(root, ListingKind::Library, Some(TitleType::Film))
            .await;

        let rated: Vec<(&str, &str)> = entries
            .iter()
            .map(|entry| (entry.url.as_str(), entry.rating.as_str()))
            .collect();
        assert_eq!(
            rated,
            vec![
                ("https://filmow.com/a-t1/", "4.0"),
                ("https://filmow.com/b-t2/", "3.0"),
                ("https://filmow.com/c-t3/", "2.0"),
            ]
        );
    }

    #[tokio::test]
    async fn test_unreachable_listing_yields_nothing() {
        let root = "https://filmow.com/usuario/x/filmes/ja-vi/";
        let recorder = Arc::new(Recorder::default());
        let mut observers = ObserverRegistry::new();
        observers.register(recorder.clone());
        let collector = collector(ScriptedFetcher::new().unreachable(root), false)
            .with_observers(observers);

        let entries = collector
            .listing_entries(root, ListingKind::Library, Some(TitleType::Film))
            .await;

        assert!(entries.is_empty());
        assert_eq!(
            recorder.events.lock().unwrap().as_slice(),
            &[format!("unreachable {root}")]
        );
    }

    #[tokio::test]
    async fn test_library_sections_carry_type_hints() {
        let user = "https://filmow.com/usuario/x/";
        let shorts = format!("{user}curtas/ja-vi/");
        let page = list_page(&["/curta-t7/"], 1);
        let fetcher = ScriptedFetcher::new()
            .page(&shorts, &page)
            .page(&format!("{shorts}?pagina=1"), &page);
        let collector = collector(fetcher, false);

        let gathered = collector
            .library_entries(
                user,
                &[CollectionKind::Watched, CollectionKind::Favorites],
                TitleFilter::Shorts,
            )
            .await;

        assert_eq!(gathered.len(), 2);
        assert_eq!(gathered[0].0, CollectionKind::Watched);
        assert_eq!(
            gathered[0].1,
            vec![Entry::new("https://filmow.com/curta-t7/", "", Some(TitleType::Short))]
        );
        assert!(gathered[1].1.is_empty());
    }
}

#[cfg(test)]
mod single_list_tests {
    use super::*;

    #[test]
    fn test_file_lines_outside_the_site_are_dropped() {
        let collector = collector(ScriptedFetcher::new(), false);
        let contents = "https://filmow.com/a-t1/\n\
                        not a url\n\
                        https://www.filmow.com/b-t2/\n\
                        https://filmowx.com/c-t3/\n\
                        ftp://filmow.com/d-t4/\n\
                        https://filmow.com/a-t1/\n";

        let entries = collector.file_entries(contents, TitleFilter::All);

        assert_eq!(
            entries,
            vec![
                Entry::bare("https://filmow.com/a-t1/"),
                Entry::bare("https://www.filmow.com/b-t2/"),
            ]
        );
    }

    #[test]
    fn test_seasons_retagged_when_series_wanted() {
        let entries = vec![
            Entry::bare("https://filmow.com/show-1a-temporada-t2/"),
            Entry::bare("https://filmow.com/film-t3/"),
        ];

        let kept = apply_season_rules(entries, TitleFilter::Series);

        assert_eq!(kept[0].title_type, Some(TitleType::Series));
        assert_eq!(kept[1].title_type, None);
    }

    #[test]
    fn test_seasons_dropped_otherwise() {
        let entries = vec![
            Entry::bare("https://filmow.com/show-1a-temporada-t2/"),
            Entry::bare("https://filmow.com/film-t3/"),
        ];

        let kept = apply_season_rules(entries, TitleFilter::Films);

        assert_eq!(kept, vec![Entry::bare("https://filmow.com/film-t3/")]);
    }
}

#[cfg(test)]
mod collect_tests {
    use super::*;

    #[tokio::test]
    async fn test_rows_filtered_by_hint_and_inferred_type() {
        let fetcher = ScriptedFetcher::new()
            .page("https://filmow.com/long-t1/", &entry_page("Filmes", "Long", "100 min"))
            .page("https://filmow.com/short-t2/", &entry_page("Filmes", "Short", "20 min"))
            .page("https://filmow.com/show-t3/", &entry_page("Séries", "Show", "50 min"));
        let collector = collector(fetcher, false);
        let entries = vec![
            Entry::bare("https://filmow.com/long-t1/"),
            Entry::bare("https://filmow.com/short-t2/"),
            Entry::new("https://filmow.com/show-t3/", "", Some(TitleType::Series)),
        ];

        let collected = collector
            .collect(&entries, TitleFilter::Features, Progress { start: 0, total: 3 })
            .await;

        assert_eq!(collected.rows.len(), 1);
        assert_eq!(collected.rows[0].title, "Long");
        assert_eq!(collected.rows[0].title_type, "film");
        assert_eq!(collected.stats.skipped, 2);
    }

    #[tokio::test]
    async fn test_failed_entries_are_reported_and_skipped() {
        let recorder = Arc::new(Recorder::default());
        let mut observers = ObserverRegistry::new();
        observers.register(recorder.clone());
        let fetcher = ScriptedFetcher::new()
            .page("https://filmow.com/ok-t1/", &entry_page("Filmes", "Ok", "90"))
            .status("https://filmow.com/gone-t2/", 404);
        let collector = collector(fetcher, false).with_observers(observers);
        let entries = vec![
            Entry::bare("https://filmow.com/gone-t2/"),
            Entry::bare("https://filmow.com/ok-t1/"),
        ];

        let collected = collector
            .collect(&entries, TitleFilter::All, Progress { start: 4, total: 10 })
            .await;

        assert_eq!(collected.rows.len(), 1);
        assert_eq!(collected.stats.fetch_failures, 1);
        assert_eq!(
            recorder.events.lock().unwrap().as_slice(),
            &[
                "failed https://filmow.com/gone-t2/".to_string(),
                "entry 6/10".to_string(),
                "finished 10".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_dates_page_fills_missing_year() {
        let fetcher = ScriptedFetcher::new()
            .page("https://filmow.com/old-t42/", &entry_page("Filmes", "Old", "80"))
            .page(
                "https://filmow.com/estreias-do-filme/42/",
                "<table><tr><td>Mundial</td><td>1 Jan 1950</td><td>x</td></tr></table>",
            );
        let collector = collector(fetcher, true);
        let urls = vec!["https://filmow.com/old-t42/".to_string()];
        collector.prefetch_entries(&urls);

        let collected = collector
            .collect(
                &[Entry::bare(&urls[0])],
                TitleFilter::All,
                Progress { start: 0, total: 1 },
            )
            .await;

        assert_eq!(collected.rows[0].year, "1950");
    }

    #[tokio::test]
    async fn test_dates_page_not_used_when_disabled() {
        let fetcher = ScriptedFetcher::new()
            .page("https://filmow.com/old-t42/", &entry_page("Filmes", "Old", "80"))
            .page(
                "https://filmow.com/estreias-do-filme/42/",
                "<table><tr><td>Mundial</td><td>1 Jan 1950</td><td>x</td></tr></table>",
            );
        let collector = collector(fetcher, false);

        let collected = collector
            .collect(
                &[Entry::bare("https://filmow.com/old-t42/")],
                TitleFilter::All,
                Progress { start: 0, total: 1 },
            )
            .await;

        assert_eq!(collected.rows[0].year, "");
    }
}
