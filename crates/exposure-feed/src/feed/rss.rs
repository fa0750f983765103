//! RSS 2.0 document writer

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io;

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";
const DOCS_URL: &str = "http://www.rssboard.org/rss-specification";
const GENERATOR: &str = concat!("exposure-feed ", env!("CARGO_PKG_VERSION"));

/// RFC 2822 date in UTC with a zero padded day of month
pub fn rfc2822(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S +0000").to_string()
}

/// One `<item>` of a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: Option<String>,
    /// HTML fragment, written as CDATA
    pub description: String,
    /// Written with `isPermaLink="false"`
    pub guid: String,
    pub pub_date: DateTime<Utc>,
}

/// An RSS channel and its items, in publication order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<FeedItem>,
}

impl Channel {
    /// Serialize the channel as a complete RSS document
    ///
    /// The output depends only on the channel and `built`, so the same state and
    /// clock always produce the same bytes.
    pub fn render(&self, built: DateTime<Utc>) -> io::Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("xmlns:atom", ATOM_NS));
        rss.push_attribute(("xmlns:content", CONTENT_NS));
        rss.push_attribute(("version", "2.0"));
        writer.write_event(Event::Start(rss))?;
        writer.write_event(Event::Start(BytesStart::new("channel")))?;

        text_element(&mut writer, "title", &self.title)?;
        text_element(&mut writer, "link", &self.link)?;
        text_element(&mut writer, "description", &self.description)?;
        text_element(&mut writer, "docs", DOCS_URL)?;
        text_element(&mut writer, "generator", GENERATOR)?;
        text_element(&mut writer, "lastBuildDate", &rfc2822(built))?;

        for item in &self.items {
            write_item(&mut writer, item)?;
        }

        writer.write_event(Event::End(BytesEnd::new("channel")))?;
        writer.write_event(Event::End(BytesEnd::new("rss")))?;

        let mut out = writer.into_inner();
        out.push(b'\n');
        Ok(out)
    }
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> io::Result<()> {
    writer
        .create_element(name)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

fn write_item(writer: &mut Writer<Vec<u8>>, item: &FeedItem) -> io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("item")))?;

    text_element(writer, "title", &item.title)?;
    if let Some(link) = &item.link {
        text_element(writer, "link", link)?;
    }

    // A CDATA section cannot contain its own terminator
    if item.description.contains("]]>") {
        text_element(writer, "description", &item.description)?;
    } else {
        writer
            .create_element("description")
            .write_cdata_content(BytesCData::new(item.description.as_str()))?;
    }

    writer
        .create_element("guid")
        .with_attribute(("isPermaLink", "false"))
        .write_text_content(BytesText::new(&item.guid))?;
    text_element(writer, "pubDate", &rfc2822(item.pub_date))?;

    writer.write_event(Event::End(BytesEnd::new("item")))?;
    Ok(())
}
