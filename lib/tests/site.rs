use std::fs;
use std::path::Path;

use prism::multiview::{MultiView, ScriptNegotiator};
use prism::scan::Scanner;
use prism::transform::{FrontMatter, Markdown};
use prism::url::{Url, UrlBuf};
use prism::value::Value;
use prism::write::Writer;
use prism::{Content, Pipeline, Resource};

fn write(root: &Path, path: &str, contents: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn site(source: &Path) -> Pipeline {
    Scanner::new(source)
        .pipeline()
        .transform(FrontMatter::new(), FrontMatter::filter())
        .transform(Markdown::new(), Markdown::filter())
        .move_paths(|path: &Url| {
            let mut path = UrlBuf::from(path);
            if path.extension() == Some("md") {
                path.set_extension(Some("html"));
            }

            path
        })
        .divide(MultiView::new().negotiator(ScriptNegotiator::new()))
}

#[tokio::test]
async fn front_matter_then_markdown() {
    let content = Content::new("text/markdown", "---\ntitle: Hello\n---\n# Hi *there*\n").unwrap();
    let pipeline = Pipeline::from_resources([Resource::new("/hi.md", [content]).unwrap()])
        .transform(FrontMatter::new(), FrontMatter::filter())
        .transform(Markdown::new(), Markdown::filter());

    let resources = pipeline.collect().await.unwrap();
    let html = resources[0].single().unwrap();
    assert_eq!(html.media_type().as_str(), "text/html");

    let (body, metadata) = html.load().await.unwrap();
    assert_eq!(body.as_text(), Some("<h1>Hi <em>there</em></h1>\n"));
    assert_eq!(metadata["title"], Value::from("Hello"));
}

#[tokio::test]
async fn scan_split_and_write() {
    let source = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(source.path(), "index.en.md", "+++\ntitle = \"Home\"\n+++\nWelcome");
    write(source.path(), "index.ko.md", "+++\ntitle = \"홈\"\n+++\n환영합니다");
    write(source.path(), "about.md", "About");
    write(source.path(), "css/site.css", "body { margin: 0 }");

    let pipeline = site(source.path());
    let mut paths: Vec<String> = pipeline.collect().await.unwrap()
        .iter()
        .map(|r| r.path().to_string())
        .collect();

    paths.sort();
    assert_eq!(paths, ["/about.html", "/css/site.css", "/index.en.html", "/index.html", "/index.ko.html"]);

    let writer = Writer::new(output.path());
    assert_eq!(writer.write_all(&pipeline).await.unwrap(), 5);

    let read = |path: &str| fs::read_to_string(output.path().join(path)).unwrap();
    assert_eq!(read("index.ko.html"), "<p>환영합니다</p>\n");
    assert_eq!(read("about.html"), "<p>About</p>\n");
    assert_eq!(read("css/site.css"), "body { margin: 0 }");
    assert!(read("index.html").contains("location.replace"));
    assert!(read("index.html").contains(r#"href="/index.en.html""#));

    // Nothing changed: nothing is rewritten.
    assert_eq!(writer.write_all(&pipeline).await.unwrap(), 0);
}

#[tokio::test]
async fn views_carry_their_front_matter() {
    let source = tempfile::tempdir().unwrap();
    write(source.path(), "post.en.md", "---\ntitle: Post\n---\nText");
    write(source.path(), "post.ko.md", "---\ntitle: 글\n---\n본문");

    let resources = site(source.path()).collect().await.unwrap();
    let ko = resources.iter().find(|r| r.path() == "/post.ko.html").unwrap();
    let metadata = ko.single().unwrap().metadata().await.unwrap();

    assert_eq!(metadata["title"], Value::from("글"));
    assert_eq!(metadata["viewKey"], Value::from("text/html; lang=ko"));

    let views = metadata["multiViews"].as_dict().unwrap();
    let keys: Vec<&str> = views.keys().map(|k| &**k).collect();
    assert_eq!(keys, ["/post.en.html", "/post.ko.html"]);
}

#[tokio::test]
async fn reload_rebuilds_on_each_pulse() {
    let source = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(source.path(), "a.md", "A");

    let (tx, rx) = futures::channel::mpsc::unbounded();
    let pipeline = site(source.path()).with_reload(rx);
    let writer = Writer::new(output.path()).force(true);

    tx.unbounded_send(()).unwrap();
    tx.unbounded_send(()).unwrap();
    drop(tx);

    let mut reloads = 0;
    let builds = pipeline
        .for_each_with_reloading(|resource| {
            let writer = writer.clone();
            async move { writer.write(&resource).await.map(|_| ()) }
        }, || reloads += 1)
        .await
        .unwrap();

    assert_eq!(builds, 3);
    assert_eq!(reloads, 2);
    assert_eq!(fs::read_to_string(output.path().join("a.html")).unwrap(), "<p>A</p>\n");
}
