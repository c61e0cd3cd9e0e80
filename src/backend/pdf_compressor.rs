use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use lopdf::Document;

use super::{Compressor, DocumentOptions};
use crate::error::{BackendError, BackendResult};

/// Rewrites a PDF through `lopdf`. Level-independent: only `DocumentOptions` matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfCompressor;

#[async_trait]
impl Compressor for PdfCompressor {
    type Options = DocumentOptions;

    async fn compress(&self, input: Arc<[u8]>, options: &DocumentOptions) -> BackendResult<Vec<u8>> {
        let options = options.clone();
        tokio::task::spawn_blocking(move || {
            let mut doc = load(&input)?;
            serialize(&mut doc, &options)
        })
        .await?
    }

    fn name(&self) -> &'static str {
        "pdf"
    }
}

pub fn load(input: &[u8]) -> BackendResult<Document> {
    let mut doc = Document::load_mem(input).map_err(|e| BackendError::Load(format!("{:?}", e)))?;

    if doc.is_encrypted() {
        debug!("PDF is encrypted, attempting empty password");
        if let Err(e) = doc.decrypt(b"") {
            warn!("Failed to decrypt with empty password: {:?}", e);
        }
    }

    Ok(doc)
}

pub fn serialize(doc: &mut Document, options: &DocumentOptions) -> BackendResult<Vec<u8>> {
    if options.use_object_streams {
        return Err(BackendError::Serialize(
            "object streams are not supported by this writer".to_string(),
        ));
    }

    if options.compress_streams {
        doc.compress();
    }

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| BackendError::Serialize(format!("{:?}", e)))?;
    debug!("Serialized PDF with {} objects, {} bytes", doc.objects.len(), buffer.len());
    Ok(buffer)
}

/// Single-page PDF with one plain, highly compressible content stream.
#[cfg(test)]
pub(crate) fn sample_pdf() -> Vec<u8> {
    use lopdf::{dictionary, Dictionary, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let content = b"BT /F1 12 Tf 72 712 Td (Hello) Tj ET\n".repeat(200);
    let content_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), content)));
    let page_id = doc.add_object(dictionary! {
        "Type" => Object::Name(b"Page".to_vec()),
        "Parent" => Object::Reference(pages_id),
        "Contents" => Object::Reference(content_id),
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => Object::Name(b"Pages".to_vec()),
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => Object::Name(b"Catalog".to_vec()),
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}
