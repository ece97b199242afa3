//! Download-link and snippet scraping for opaque websites.

use super::PageFetcher;
use crate::candidate::{Candidate, CandidateOrigin, ScriptDocument};
use crate::context::{ResolutionContext, SourceDocument, SourceKind};
use crate::error::{ResolveError, Result};
use crate::pattern::literal;
use crate::pipeline::Unit;
use anyinstall_common::{InstallFormat, get_extension};
use log::debug;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static ANCHOR_HREF: LazyLock<Regex> = LazyLock::new(|| {
    literal(r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
});
static PREFORMATTED: LazyLock<Regex> =
    LazyLock::new(|| literal(r"(?is)<pre\b[^>]*>(.*?)</pre\s*>"));
static TAG: LazyLock<Regex> = LazyLock::new(|| literal(r"(?s)<[^>]*>"));

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn is_download_link(url: &Url) -> bool {
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let Some(name) = url.path_segments().and_then(|mut segments| segments.next_back()) else {
        return false;
    };
    InstallFormat::from_extension(&get_extension(name))
        .is_some_and(|format| format != InstallFormat::Binary)
}

/// Absolute download links found in `html`, in page order.
///
/// Relative hrefs are resolved against `base`. Only http(s) links whose file
/// name carries a known installable extension are kept; repeats are dropped.
///
/// # Examples
///
/// ```
/// use anyinstall::source::extract_links;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/download/")?;
/// let html = r#"<a href="tool-1.0.dmg">macOS</a> <a href="/about">About</a>"#;
/// let links = extract_links(html, &base);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.com/download/tool-1.0.dmg");
/// # Ok::<(), url::ParseError>(())
/// ```
#[must_use]
pub fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    ANCHOR_HREF
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .filter_map(|href| base.join(unescape(href.as_str()).trim()).ok())
        .filter(is_download_link)
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Plain text of every `<pre>` element in `html`.
#[must_use]
pub fn extract_preformatted(html: &str) -> Vec<String> {
    PREFORMATTED
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|inner| unescape(&TAG.replace_all(inner.as_str(), "")))
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
        .collect()
}

/// Scrapes a website for download links and install snippets.
///
/// Reads `source`; writes `candidates` and `documents`. Each `<pre>` block
/// becomes a fenced block of one webpage document for the script provider.
pub struct WebsiteProvider {
    fetcher: Box<dyn PageFetcher>,
    base: i64,
}

impl WebsiteProvider {
    /// Identifier of this unit.
    pub const ID: &'static str = "website-links";

    /// Creates the provider; scraped links start at `base` priority.
    #[must_use]
    pub const fn new(fetcher: Box<dyn PageFetcher>, base: i64) -> Self {
        Self { fetcher, base }
    }
}

impl Unit for WebsiteProvider {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        matches!(ctx.source, Some(SourceKind::Website(_)))
            && ctx.candidates.is_empty()
            && ctx.documents.is_empty()
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> Result<()> {
        let Some(SourceKind::Website(page)) = ctx.source.clone() else {
            return Ok(());
        };
        let html = self
            .fetcher
            .fetch_page(page.as_str())
            .map_err(|err| ResolveError::SourceUnavailable {
                source_name: page.to_string(),
                reason: err.to_string(),
            })?;

        let links = extract_links(&html, &page);
        debug!(target: "anyinstall::source", "{} download link(s) on {page}", links.len());
        for link in links {
            let Some(name) = link
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .map(ToOwned::to_owned)
            else {
                continue;
            };
            ctx.candidates
                .push(Candidate::asset(name, CandidateOrigin::Url(link), Self::ID, self.base));
        }

        let snippets = extract_preformatted(&html);
        if !snippets.is_empty() {
            let text = snippets
                .iter()
                .map(|snippet| format!("```\n{snippet}\n```"))
                .collect::<Vec<_>>()
                .join("\n\n");
            ctx.documents.push(SourceDocument {
                kind: ScriptDocument::Webpage,
                text,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MockPageFetcher, SourceError};
    use anyinstall_common::{Arch, CapabilitySet, Os, PlatformProfile};
    use rstest::{fixture, rstest};

    const PAGE: &str = r#"
<html><body>
  <h1>Download Tool</h1>
  <a href="https://cdn.example.com/tool-2.1-macos-arm64.dmg">Apple silicon</a>
  <a href='/files/tool-2.1-linux-x86_64.tar.gz'>Linux</a>
  <a href="tool-2.1-setup.exe">Windows</a>
  <a href="https://cdn.example.com/tool-2.1-macos-arm64.dmg">mirror</a>
  <a href="/files/tool-2.1.tar.gz.sha256">checksum</a>
  <a href="mailto:team@example.com">Contact</a>
  <a href="/docs">Docs</a>
  <pre><code>curl -fsSL https://example.com/install.sh | sh</code></pre>
  <pre>brew install tool &amp;&amp; tool --version</pre>
</body></html>
"#;

    fn base() -> Url {
        Url::parse("https://example.com/download/").expect("valid URL")
    }

    #[fixture]
    fn context() -> ResolutionContext {
        let mut ctx = ResolutionContext::new(
            "https://example.com/download/",
            PlatformProfile::new(Os::Darwin, Arch::Arm64),
            CapabilitySet::default(),
        );
        ctx.source = Some(SourceKind::Website(base()));
        ctx
    }

    #[test]
    fn patterns_compile() {
        LazyLock::force(&ANCHOR_HREF);
        LazyLock::force(&PREFORMATTED);
        LazyLock::force(&TAG);
    }

    #[test]
    fn links_are_resolved_filtered_and_deduplicated() {
        let links: Vec<String> = extract_links(PAGE, &base())
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            links,
            [
                "https://cdn.example.com/tool-2.1-macos-arm64.dmg",
                "https://example.com/files/tool-2.1-linux-x86_64.tar.gz",
                "https://example.com/download/tool-2.1-setup.exe",
            ]
        );
    }

    #[rstest]
    #[case::entity("<pre>a &lt;b&gt; &amp; c</pre>", "a <b> & c")]
    #[case::nested("<PRE class=\"x\"><span>brew</span> install x</PRE>", "brew install x")]
    fn preformatted_text_is_plain(#[case] html: &str, #[case] expected: &str) {
        assert_eq!(extract_preformatted(html), [expected]);
    }

    #[rstest]
    fn scraping_yields_links_and_a_webpage_document(mut context: ResolutionContext) {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch_page()
            .withf(|url| url == "https://example.com/download/")
            .times(1)
            .returning(|_| Ok(PAGE.to_owned()));
        let mut unit = WebsiteProvider::new(Box::new(fetcher), 40);
        assert!(unit.should_run(&context));

        unit.execute(&mut context).expect("page is scraped");

        assert_eq!(context.candidates.len(), 3);
        assert!(context.candidates.iter().all(|c| c.priority() == 40));
        let document = context.documents.first().expect("webpage document");
        assert_eq!(document.kind, ScriptDocument::Webpage);
        assert!(document.text.contains("```\ncurl -fsSL https://example.com/install.sh | sh\n```"));
        assert!(!unit.should_run(&context));
    }

    #[rstest]
    fn fetch_failures_are_terminal(mut context: ResolutionContext) {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch_page().returning(|_| {
            Err(SourceError::Unavailable {
                resource: "page".to_owned(),
                reason: "connection refused".to_owned(),
            })
        });
        let mut unit = WebsiteProvider::new(Box::new(fetcher), 40);

        let err = unit.execute(&mut context).expect_err("fetch fails");

        assert!(matches!(err, ResolveError::SourceUnavailable { .. }));
    }
}
