use std::time::Duration;

use bugbridge_engine::{HostPage, PageError};
use tokio::time::{sleep, timeout};

const SHELL: &str = r#"<html><body><div id="root"><div class="toolbar"></div></div></body></html>"#;

fn page() -> HostPage {
    HostPage::new("https://example.com/", SHELL)
}

#[tokio::test]
async fn waiter_resolves_immediately_for_existing_element() {
    let page = page();
    let existing = page.query_selector(".toolbar").unwrap().unwrap();
    let found = page.wait_for_element(".toolbar").await.unwrap();
    assert_eq!(found, existing);
}

#[tokio::test]
async fn waiter_resolves_once_element_is_inserted() {
    let page = page();
    let root = page.query_selector("#root").unwrap().unwrap();

    let insert = async {
        sleep(Duration::from_millis(10)).await;
        page.append_html(root, r#"<span class="unrelated"></span>"#).unwrap();
        sleep(Duration::from_millis(10)).await;
        page.append_html(root, r#"<div class="group-actions"></div>"#)
            .unwrap()
    };
    let (found, inserted) = tokio::join!(page.wait_for_element(".group-actions"), insert);

    assert_eq!(found.unwrap(), inserted);
    assert_eq!(page.revision(), 2);
}

#[tokio::test]
async fn concurrent_waiters_are_independent() {
    let page = page();
    let root = page.query_selector("#root").unwrap().unwrap();

    let insert = async {
        sleep(Duration::from_millis(10)).await;
        page.append_html(root, r#"<p class="a"></p><p class="b"></p>"#)
            .unwrap()
    };
    let (a, b, first) = tokio::join!(
        page.wait_for_element(".a"),
        page.wait_for_element(".b"),
        insert
    );

    assert_eq!(a.unwrap(), first);
    assert_ne!(b.unwrap(), first);
}

#[tokio::test]
async fn waiter_stays_pending_without_a_match() {
    let page = page();
    let waited = timeout(Duration::from_millis(30), page.wait_for_element(".never")).await;
    assert!(waited.is_err());
}

#[tokio::test]
async fn invalid_selector_is_an_error() {
    let page = page();
    assert!(matches!(
        page.wait_for_element("[[").await,
        Err(PageError::InvalidSelector { .. })
    ));
    assert!(page.query_selector("").is_err());
}

#[test]
fn attributes_and_text_are_mutated_in_place() {
    let page = page();
    let toolbar = page.query_selector(".toolbar").unwrap().unwrap();
    let link = page
        .append_html(toolbar, r#"<a class="btn"><span>old</span></a>"#)
        .unwrap();
    let label = page.select_within(link, "span").unwrap().unwrap();

    page.set_attribute(link, "href", "https://x.test/?a=1&b=\"2\"").unwrap();
    page.set_text_content(label, "New <label> & more").unwrap();

    assert_eq!(
        page.attribute(link, "href").unwrap().as_deref(),
        Some("https://x.test/?a=1&b=\"2\"")
    );
    assert_eq!(page.attribute(link, "class").unwrap().as_deref(), Some("btn"));
    assert_eq!(page.text_content(link).unwrap(), "New <label> & more");
    // Same node, still the only link.
    assert_eq!(page.query_selector_all("a.btn").unwrap(), vec![link]);
    assert_eq!(page.select_within(link, "span").unwrap(), Some(label));
}

#[test]
fn removed_elements_become_stale() {
    let page = page();
    let toolbar = page.query_selector(".toolbar").unwrap().unwrap();
    page.remove(toolbar).unwrap();

    assert_eq!(page.query_selector(".toolbar").unwrap(), None);
    assert_eq!(
        page.set_attribute(toolbar, "title", "x"),
        Err(PageError::StaleElement(toolbar))
    );
}

#[test]
fn location_changes_do_not_count_as_mutations() {
    let page = page();
    page.set_location("https://example.com/next/");
    assert_eq!(page.location(), "https://example.com/next/");
    assert_eq!(page.revision(), 0);
}

#[test]
fn removed_subtrees_are_not_matched() {
    let page = page();
    let toolbar = page.query_selector(".toolbar").unwrap().unwrap();
    let button = page
        .append_html(toolbar, r#"<a class="action">Go</a>"#)
        .unwrap();
    page.remove(toolbar).unwrap();

    assert!(!page.contains(toolbar));
    assert!(!page.contains(button));
    assert!(page.query_selector_all(".action").unwrap().is_empty());
    assert!(!page.html().contains("action"));
}

#[tokio::test]
async fn waiter_skips_removed_elements() {
    let page = page();
    let stale = page.query_selector(".toolbar").unwrap().unwrap();
    page.remove(stale).unwrap();
    let root = page.query_selector("#root").unwrap().unwrap();

    let insert = async {
        sleep(Duration::from_millis(10)).await;
        page.append_html(root, r#"<div class="toolbar"></div>"#).unwrap()
    };
    let (found, inserted) = tokio::join!(page.wait_for_element(".toolbar"), insert);

    let found = found.unwrap();
    assert_ne!(found, stale);
    assert_eq!(found, inserted);
}

#[test]
fn clearing_text_keeps_child_elements() {
    let page = page();
    let toolbar = page.query_selector(".toolbar").unwrap().unwrap();
    let link = page
        .append_html(toolbar, r#"<a>Old <img src="i.png"> label</a>"#)
        .unwrap();

    page.clear_text(link).unwrap();

    assert_eq!(page.text_content(link).unwrap(), "");
    assert!(page.select_within(link, "img").unwrap().is_some());
}
