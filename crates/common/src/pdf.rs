//! PDF inspection using lopdf.

use tracing::debug;

/// Number of pages in a PDF document; 0 when the bytes do not parse.
///
/// Parsing is CPU bound, call it from `spawn_blocking` in async code.
pub fn count_pages(bytes: &[u8]) -> usize {
    match lopdf::Document::load_mem(bytes) {
        Ok(doc) => {
            let pages = doc.get_pages().len();
            debug!(pages, size = bytes.len(), "Parsed PDF");
            pages
        }
        Err(e) => {
            debug!(error = %e, size = bytes.len(), "Failed to parse PDF");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Document, Object, Stream};

    fn build_pdf(pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::new();
        for _ in 0..pages {
            let content_id = doc.add_object(Stream::new(dictionary! {}, b"BT ET".to_vec()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_counts_pages() {
        assert_eq!(count_pages(&build_pdf(1)), 1);
        assert_eq!(count_pages(&build_pdf(5)), 5);
    }

    #[test]
    fn test_garbage_has_no_pages() {
        assert_eq!(count_pages(b"definitely not a pdf"), 0);
        assert_eq!(count_pages(&[]), 0);
    }
}
