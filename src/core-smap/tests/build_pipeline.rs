use std::sync::Arc;

use core_smap::{
    BuildConfig, BuildCoordinator, CACHE_NAMESPACE, CacheGateway, CacheStore, Document, LocalBuildLock, MemoryCache,
    MemoryContentRepository, OutputFormat, OutputTarget, Served,
};
use quick_xml::Reader;
use quick_xml::events::Event;

/// One parsed `url` element.
#[derive(Debug, Default, PartialEq)]
struct UrlElement {
    loc: String,
    priority: String,
    changefreq: String,
    /// (hreflang, href) of each `xhtml:link`.
    links: Vec<(String, String)>,
}

fn parse_urls(xml: &str) -> Vec<UrlElement> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut urls = Vec::new();
    let mut current: Option<UrlElement> = None;
    let mut field = String::new();
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) => {
                let name = String::from_utf8(e.name().as_ref().to_vec()).unwrap();
                if name == "url" {
                    current = Some(UrlElement::default());
                }
                field = name;
            }
            Event::Empty(e) if e.name().as_ref() == b"xhtml:link" => {
                let mut hreflang = String::new();
                let mut href = String::new();
                for attribute in e.attributes() {
                    let attribute = attribute.unwrap();
                    let value = attribute.unescape_value().unwrap().into_owned();
                    match attribute.key.as_ref() {
                        b"hreflang" => hreflang = value,
                        b"href" => href = value,
                        _ => {}
                    }
                }
                if let Some(url) = current.as_mut() {
                    url.links.push((hreflang, href));
                }
            }
            Event::Text(t) => {
                let text = t.unescape().unwrap().into_owned();
                if let Some(url) = current.as_mut() {
                    match field.as_str() {
                        "loc" => url.loc = text,
                        "priority" => url.priority = text,
                        "changefreq" => url.changefreq = text,
                        _ => {}
                    }
                }
            }
            Event::End(e) if e.name().as_ref() == b"url" => {
                urls.extend(current.take());
            }
            Event::Eof => break,
            _ => {}
        }
    }
    urls
}

fn three_locale_site() -> MemoryContentRepository {
    MemoryContentRepository::new()
        .with_locales(&["en", "es", "fr"])
        .with_page("en", Document::page("home", "/", 0, 0).with_group_key("home"))
        .with_page("es", Document::page("home", "/es/", 0, 0).with_group_key("home"))
        .with_page("fr", Document::page("home", "https://fr.example/", 0, 0).with_group_key("home"))
        .with_page("en", Document::page("default-page", "/about", 1, 0))
        .with_item("en", Document::item("article", "/articles/a&b"))
}

fn coordinator(repository: MemoryContentRepository, cache: Arc<MemoryCache>) -> BuildCoordinator {
    BuildCoordinator::new(Arc::new(repository), cache, Arc::new(LocalBuildLock::new()))
}

#[tokio::test]
async fn test_xml_reparses_to_one_url_per_entry_in_order() {
    let cache = Arc::new(MemoryCache::new());
    let config = BuildConfig::builder().localized(true).build();
    let report = coordinator(three_locale_site(), cache.clone()).build(&config).await.unwrap();

    let xml = String::from_utf8(report.artifacts[0].data.clone()).unwrap();
    let urls = parse_urls(&xml);

    let locs: Vec<&str> = urls.iter().map(|u| u.loc.as_str()).collect();
    assert_eq!(locs, vec!["/", "/about", "/articles/a&b", "/es/", "https://fr.example/"]);
    assert_eq!(urls.len(), report.records);
    assert!(urls.iter().all(|u| u.changefreq == "daily"));
    assert_eq!(urls[1].priority, "0.9");
    assert_eq!(urls[2].priority, "0.7");
}

#[tokio::test]
async fn test_three_locales_sharing_content_link_to_the_other_two() {
    let cache = Arc::new(MemoryCache::new());
    let config = BuildConfig::builder().localized(true).build();
    let report = coordinator(three_locale_site(), cache).build(&config).await.unwrap();

    let xml = String::from_utf8(report.artifacts[0].data.clone()).unwrap();
    let urls = parse_urls(&xml);
    let link = |locale: &str, url: &str| (locale.to_string(), url.to_string());

    let home = |loc: &str| urls.iter().find(|u| u.loc == loc).unwrap();
    assert_eq!(home("/").links, vec![link("es", "/es/"), link("fr", "https://fr.example/")]);
    assert_eq!(home("/es/").links, vec![link("en", "/"), link("fr", "https://fr.example/")]);
    assert_eq!(home("https://fr.example/").links, vec![link("en", "/"), link("es", "/es/")]);
    for url in &urls {
        assert!(url.links.iter().all(|(_, href)| *href != url.loc));
    }
    assert!(!xml.contains("home"));
}

#[tokio::test]
async fn test_per_locale_build_and_serve() {
    let cache = Arc::new(MemoryCache::new());
    let config = BuildConfig::builder()
        .localized(true)
        .per_locale(true)
        .base_url("https://example.com")
        .build();
    let gateway = CacheGateway::new(coordinator(three_locale_site(), cache.clone()), config);

    let Served::Found(index) = gateway.serve("/sitemaps/index.xml").await.unwrap() else {
        panic!("index should be built on first request");
    };
    let index = String::from_utf8(index).unwrap();
    for locale in ["en", "es", "fr"] {
        assert!(index.contains(&format!("<loc>https://example.com/sitemaps/{}.xml</loc>", locale)));
    }

    let Served::Found(es) = gateway.serve("/sitemaps/es.xml").await.unwrap() else {
        panic!("es sitemap should be cached");
    };
    let es = parse_urls(&String::from_utf8(es).unwrap());
    assert_eq!(es.len(), 1);
    assert_eq!(es[0].loc, "/es/");
    assert_eq!(es[0].links.len(), 2);

    assert_eq!(gateway.serve("/sitemaps/bogus.xml").await.unwrap(), Served::NotFound);
    assert_eq!(cache.keys(CACHE_NAMESPACE).await.len(), 4);
}

#[tokio::test]
async fn test_cleared_cache_is_rebuilt_on_next_request() {
    let cache = Arc::new(MemoryCache::new());
    let coordinator = coordinator(three_locale_site(), cache.clone());
    let gateway = CacheGateway::new(coordinator.clone(), BuildConfig::default());

    gateway.serve("sitemap.xml").await.unwrap();
    coordinator.clear_cache().await.unwrap();
    assert!(cache.get(CACHE_NAMESPACE, "sitemap.xml").await.unwrap().is_none());

    assert!(matches!(gateway.serve("sitemap.xml").await.unwrap(), Served::Found(_)));
    assert_eq!(cache.set_count(), 2);
}

#[tokio::test]
async fn test_plaintext_report_to_file() {
    let dir = std::env::temp_dir().join(format!("core-smap-text-{}", uuid::Uuid::new_v4()));
    let config = BuildConfig::builder()
        .format(OutputFormat::Text)
        .indent(true)
        .per_locale(true)
        .exclude_type("article")
        .target(OutputTarget::Files {
            output_dir: dir.clone(),
            file: Some("report.txt".into()),
        })
        .build();

    let cache = Arc::new(MemoryCache::new());
    coordinator(three_locale_site(), cache.clone()).build(&config).await.unwrap();

    let report = std::fs::read_to_string(dir.join("report.txt")).unwrap();
    assert_eq!(report, "/\n  /about\n");
    assert_eq!(cache.set_count(), 0);
    std::fs::remove_dir_all(&dir).unwrap();
}
