use serde::{Deserialize, Serialize};

use super::slug::slugify;

/// One book as published by the remote catalog source.
///
/// Records are never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "image")]
    pub image_url: String,
    #[serde(rename = "downloads", default)]
    pub download_count: u64,
    #[serde(rename = "pdf")]
    pub pdf_url: String,
}

/// A book as exposed by the catalog API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier for the book
    pub id: u64,
    /// URL-friendly slug derived from id and title
    pub slug: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub downloads: u64,
    pub pdf: String,
}

impl From<&BookRecord> for Book {
    fn from(record: &BookRecord) -> Self {
        Self {
            id: record.id,
            slug: slugify(record.id, &record.title),
            title: record.title.clone(),
            description: record.description.clone(),
            image: record.image_url.clone(),
            downloads: record.download_count,
            pdf: record.pdf_url.clone(),
        }
    }
}

/// One page of the catalog with links to its neighbours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope {
    /// Total number of records in the catalog
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    /// 1-based page number that was served
    pub page: usize,
    pub page_size: usize,
    pub books: Vec<Book>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_reads_remote_field_names() {
        let record: BookRecord = serde_json::from_str(
            r#"{
                "id": 7,
                "title": "Moby Dick",
                "description": "A whale of a tale",
                "image": "https://cdn.example.com/7.jpg",
                "downloads": 1200,
                "pdf": "https://cdn.example.com/7.pdf"
            }"#,
        )
        .unwrap();

        assert_eq!(record.id, 7);
        assert_eq!(record.image_url, "https://cdn.example.com/7.jpg");
        assert_eq!(record.download_count, 1200);
        assert_eq!(record.pdf_url, "https://cdn.example.com/7.pdf");
    }

    #[test]
    fn book_carries_slug_and_public_fields() {
        let record = BookRecord {
            id: 42,
            title: "The Great Gatsby!!".to_string(),
            description: "Jazz age".to_string(),
            image_url: "https://cdn.example.com/42.jpg".to_string(),
            download_count: 3,
            pdf_url: "https://cdn.example.com/42.pdf".to_string(),
        };

        let json = serde_json::to_value(Book::from(&record)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 42,
                "slug": "42-the-great-gatsby",
                "title": "The Great Gatsby!!",
                "description": "Jazz age",
                "image": "https://cdn.example.com/42.jpg",
                "downloads": 3,
                "pdf": "https://cdn.example.com/42.pdf"
            })
        );
    }

    #[test]
    fn envelope_uses_camel_case_page_size() {
        let envelope = PageEnvelope {
            count: 0,
            next: None,
            previous: None,
            page: 1,
            page_size: 20,
            books: Vec::new(),
        };

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["pageSize"], 20);
        assert!(json["next"].is_null());
        assert!(json["books"].as_array().unwrap().is_empty());
    }
}
