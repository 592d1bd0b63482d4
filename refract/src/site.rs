use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::{self, Stream};
use tokio::io::{AsyncBufReadExt, BufReader};

use prism::config::{Settings, SETTINGS_FILE};
use prism::error::Result;
use prism::scan::Scanner;
use prism::transform::{FrontMatter, Markdown, Sass};
use prism::url::{Url, UrlBuf};
use prism::value::{Dict, Value};
use prism::write::Writer;
use prism::{Content, Criterion, MediaType, Pipeline, Replace};

use crate::flags::Refract;

pub async fn build(flags: Refract) -> Result<()> {
    let settings = settings(&flags)?;
    tracing::info!(source = %settings.source.display(), output = %settings.output.display(), "building");

    let mut pipeline = pipeline(&settings)?;
    if flags.watch {
        pipeline = pipeline.with_reload(stdin_lines());
    }

    let writer = Writer::new(&settings.output).force(settings.force);
    let written = Arc::new(AtomicUsize::new(0));
    let builds = pipeline
        .for_each_with_reloading(|resource| {
            let (writer, written) = (writer.clone(), written.clone());
            async move {
                if writer.write(&resource).await? {
                    written.fetch_add(1, Ordering::Relaxed);
                }

                Ok(())
            }
        }, || tracing::info!("sources changed"))
        .await?;

    tracing::info!(builds, written = written.load(Ordering::Relaxed), "done");
    Ok(())
}

fn settings(flags: &Refract) -> Result<Settings> {
    let mut settings = match &flags.config {
        Some(path) => Settings::load(path)?,
        None if Path::new(SETTINGS_FILE).is_file() => Settings::load(SETTINGS_FILE)?,
        None => Settings::default(),
    };

    if let Some(source) = &flags.source {
        settings.source = source.clone();
    }

    if let Some(output) = &flags.output {
        settings.output = output.clone();
    }

    settings.force |= flags.force;
    Ok(settings)
}

fn pipeline(settings: &Settings) -> Result<Pipeline> {
    let sass = Sass::new()
        .load_path(&settings.source)
        .compressed(settings.compress_css);

    let mut pipeline = Scanner::new(&settings.source)
        .pipeline()
        .transform(FrontMatter::new(), FrontMatter::filter())
        .transform(Markdown::new(), Markdown::filter())
        .transform(sass, Sass::filter());

    if !settings.site.is_empty() {
        let site = Value::from(Arc::new(settings.site.clone()));
        pipeline = pipeline.transform(move |content: Content| {
            let site = site.clone();
            async move {
                Ok(content.replace(Replace::new().metadata_with(move |mut metadata: Dict| async move {
                    metadata.insert("site".into(), site);
                    Ok(metadata)
                })))
            }
        }, Criterion::any());
    }

    Ok(pipeline.move_paths(output_path).divide(settings.multiview()?))
}

/// Renames sources to what they are rendered as: `a.md` to `a.html`,
/// `a.scss` to `a.css`.
fn output_path(path: &Url) -> UrlBuf {
    let mut path = UrlBuf::from(path);
    let rendered = path.extension()
        .and_then(MediaType::from_extension)
        .and_then(|ty| match ty.as_str() {
            "text/markdown" => Some("html"),
            "text/x-scss" | "text/x-sass" => Some("css"),
            _ => None,
        });

    if rendered.is_some() {
        path.set_extension(rendered);
    }

    path
}

/// Yields once per line read from standard input.
fn stdin_lines() -> impl Stream<Item = ()> + Send + 'static {
    let lines = BufReader::new(tokio::io::stdin()).lines();
    stream::unfold(lines, |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(_)) => Some(((), lines)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "stopped watching standard input");
                None
            }
        }
    })
}
