//! HTML parser for catalog listing pages
//!
//! This module extracts, using the catalog's fixed structural selectors:
//! - Category links from the side menu
//! - Book entries from a listing page
//! - The "next" pagination link

use crate::item::{ItemRecord, StarRating};
use scraper::{ElementRef, Html, Selector};
use url::Url;

const CATEGORY_LINKS: &str =
    "#default > div > div > div > aside > div.side_categories > ul > li > ul > li > a";
const LISTING_ITEMS: &str =
    "#default > div > div > div > div > section > div:nth-child(2) > ol > li";
const NEXT_LINK: &str =
    "#default > div > div > div > div > section > div:nth-child(2) > div > ul > li.next > a";

const PRODUCT_LINK: &str = "article > div.image_container > a";
const TITLE: &str = "article > h3 > a";
const PRICE: &str = "article > div.product_price > p.price_color";
const AVAILABILITY: &str = "article > div.product_price > p.instock.availability";
const RATING: &str = "article > p.star-rating";

/// A category entry from the side menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLink {
    /// Visible label, trimmed
    pub name: String,

    /// Absolute URL of the category's first listing page
    pub url: Url,
}

/// One book as it appears on a listing page, before context is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedBook {
    pub title: String,
    pub price: String,
    pub availability: String,
    /// Rating class token, e.g. `Three`; empty when absent
    pub rating_word: String,
    pub product_url: String,
}

impl ScrapedBook {
    /// Attaches the category label and country, producing a raw item record
    pub fn into_item(self, category: &str, country: String) -> ItemRecord {
        ItemRecord {
            title: self.title,
            price: self.price,
            availability: self.availability,
            star: StarRating::Word(self.rating_word),
            category: category.to_string(),
            product_url: self.product_url,
            country,
        }
    }
}

/// Extracted content of one listing page
#[derive(Debug, Clone)]
pub struct ListingPage {
    /// Books in on-page order
    pub books: Vec<ScrapedBook>,

    /// Absolute URL of the next page, if any
    pub next_page: Option<Url>,

    /// Why extraction stopped early, if an entry was unusable
    pub malformed: Option<String>,
}

fn selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("invalid selector '{}': {:?}", css, e))
}

/// Collects and trims the text content of an element
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extracts category links from the side menu
///
/// Links whose `href` cannot be resolved against `base_url` are skipped.
///
/// # Example
///
/// ```
/// use shelf_scrape::crawler::parse_categories;
/// use url::Url;
///
/// let html = r#"<html><body id="default"><div><div><div><aside>
///   <div class="side_categories"><ul><li><a href="books_1/index.html">Books</a>
///   <ul><li><a href="books/travel_2/index.html"> Travel </a></li></ul>
///   </li></ul></div></aside></div></div></div></body></html>"#;
/// let base = Url::parse("https://books.toscrape.com/catalogue/category/books_1/index.html").unwrap();
/// let categories = parse_categories(html, &base).unwrap();
/// assert_eq!(categories.len(), 1);
/// assert_eq!(categories[0].name, "Travel");
/// ```
pub fn parse_categories(html: &str, base_url: &Url) -> Result<Vec<CategoryLink>, String> {
    let document = Html::parse_document(html);
    let links = selector(CATEGORY_LINKS)?;

    let mut categories = Vec::new();
    for element in document.select(&links) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        match base_url.join(href.trim()) {
            Ok(url) => categories.push(CategoryLink {
                name: element_text(element),
                url,
            }),
            Err(e) => tracing::debug!("Skipping category link {}: {}", href, e),
        }
    }

    Ok(categories)
}

/// Selectors applied inside one listing entry
struct EntrySelectors {
    product_link: Selector,
    title: Selector,
    price: Selector,
    availability: Selector,
    rating: Selector,
}

impl EntrySelectors {
    fn new() -> Result<Self, String> {
        Ok(Self {
            product_link: selector(PRODUCT_LINK)?,
            title: selector(TITLE)?,
            price: selector(PRICE)?,
            availability: selector(AVAILABILITY)?,
            rating: selector(RATING)?,
        })
    }

    /// Extracts one entry; `position` is 1-based and only used in messages
    fn scrape(
        &self,
        item: ElementRef<'_>,
        position: usize,
        page_url: &Url,
    ) -> Result<ScrapedBook, String> {
        let href = item
            .select(&self.product_link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .ok_or_else(|| format!("item {} has no product link", position))?;
        let product_url = page_url
            .join(href.trim())
            .map_err(|e| format!("item {} has an invalid product link '{}': {}", position, href, e))?;

        let title = item
            .select(&self.title)
            .next()
            .and_then(|a| a.value().attr("title"))
            .map(|t| t.trim().to_string())
            .ok_or_else(|| format!("item {} has no title", position))?;

        let price = item.select(&self.price).next().map(element_text).unwrap_or_default();
        let availability = item
            .select(&self.availability)
            .next()
            .map(element_text)
            .unwrap_or_default();
        let rating_word = item
            .select(&self.rating)
            .next()
            .and_then(|p| p.value().classes().find(|c| *c != "star-rating"))
            .unwrap_or_default()
            .to_string();

        Ok(ScrapedBook {
            title,
            price,
            availability,
            rating_word,
            product_url: product_url.to_string(),
        })
    }
}

/// Extracts the books and the next-page link from a listing page
///
/// An entry without a product link or title makes the page malformed:
/// extraction stops there, the entries before it are kept in `books` and
/// the problem is reported in `malformed`. Missing price, availability or
/// rating degrade to empty text.
pub fn parse_listing(html: &str, page_url: &Url) -> Result<ListingPage, String> {
    let document = Html::parse_document(html);

    let items = selector(LISTING_ITEMS)?;
    let next_link = selector(NEXT_LINK)?;
    let entry = EntrySelectors::new()?;

    let mut books = Vec::new();
    let mut malformed = None;
    for (index, item) in document.select(&items).enumerate() {
        match entry.scrape(item, index + 1, page_url) {
            Ok(book) => books.push(book),
            Err(message) => {
                malformed = Some(message);
                break;
            }
        }
    }

    let next_page = match document
        .select(&next_link)
        .next()
        .and_then(|a| a.value().attr("href"))
    {
        Some(href) => Some(
            page_url
                .join(href.trim())
                .map_err(|e| format!("invalid next link '{}': {}", href, e))?,
        ),
        None => None,
    };

    Ok(ListingPage {
        books,
        next_page,
        malformed,
    })
}
