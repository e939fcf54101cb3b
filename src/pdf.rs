use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{info, warn};
use lopdf::{Bookmark, Dictionary, Document, Object, ObjectId, dictionary};
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// Merge PDF documents into `output` in input order, keeping page content,
/// fonts and images by carrying the renumbered object graphs over into a
/// rebuilt catalog and page tree. With `bookmarks`, each input contributes
/// an outline entry pointing at its first page.
pub fn merge_pdfs(inputs: &[PathBuf], output: &Path, bookmarks: bool) -> AppResult<()> {
    let mut merged = Document::with_version("1.5");
    let mut pages: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut max_id = 1;

    for (index, input) in inputs.iter().enumerate() {
        info!("adding pdf: {}", input.display());
        let mut doc = load_document(input)?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let mut first_page = true;
        for object_id in doc.get_pages().into_values() {
            if first_page && bookmarks {
                let title = format!("File {}: {}", index + 1, file_stem(input));
                merged.add_bookmark(Bookmark::new(title, [0.0, 0.0, 1.0], 0, object_id), None);
            }
            first_page = false;
            let object = doc
                .get_object(object_id)
                .map_err(|err| read_error(input, &err))?
                .to_owned();
            pages.insert(object_id, object);
        }
        objects.append(&mut doc.objects);
    }

    let mut catalog_object: Option<(ObjectId, Object)> = None;
    let mut pages_object: Option<(ObjectId, Object)> = None;

    // Catalogs and page-tree roots are folded into one of each; everything
    // else is carried over untouched.
    for (object_id, object) in objects.iter() {
        match object_kind(object) {
            b"Catalog" => {
                catalog_object = Some((
                    if let Some((id, _)) = catalog_object {
                        id
                    } else {
                        *object_id
                    },
                    object.clone(),
                ));
            }
            b"Pages" => {
                if let Ok(dictionary) = object.as_dict() {
                    let mut dictionary = dictionary.clone();
                    if let Some((_, ref existing)) = pages_object
                        && let Ok(existing) = existing.as_dict()
                    {
                        dictionary.extend(existing);
                    }
                    pages_object = Some((
                        if let Some((id, _)) = pages_object {
                            id
                        } else {
                            *object_id
                        },
                        Object::Dictionary(dictionary),
                    ));
                }
            }
            b"Page" | b"Outlines" | b"Outline" => {}
            _ => {
                merged.objects.insert(*object_id, object.clone());
            }
        }
    }

    let (pages_id, pages_root) = pages_object.ok_or_else(|| {
        AppError::merge(
            crate::tr!(
                "ページツリーが見つかりません",
                "No page tree found in the input documents"
            ),
            Some(crate::tr!(
                "入力 PDF を確認してください",
                "Check the input PDFs."
            )),
        )
    })?;
    let (catalog_id, catalog) = catalog_object.ok_or_else(|| {
        AppError::merge(
            crate::tr!(
                "カタログが見つかりません",
                "No catalog found in the input documents"
            ),
            Some(crate::tr!(
                "入力 PDF を確認してください",
                "Check the input PDFs."
            )),
        )
    })?;

    for (object_id, object) in pages.iter() {
        if let Ok(dictionary) = object.as_dict() {
            let mut dictionary = dictionary.clone();
            dictionary.set("Parent", pages_id);
            merged
                .objects
                .insert(*object_id, Object::Dictionary(dictionary));
        }
    }

    if let Ok(dictionary) = pages_root.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Count", pages.len() as u32);
        dictionary.set(
            "Kids",
            pages
                .keys()
                .map(|object_id| Object::Reference(*object_id))
                .collect::<Vec<_>>(),
        );
        merged
            .objects
            .insert(pages_id, Object::Dictionary(dictionary));
    }

    if let Ok(dictionary) = catalog.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Pages", pages_id);
        dictionary.remove(b"Outlines");
        merged
            .objects
            .insert(catalog_id, Object::Dictionary(dictionary));
    }

    merged.trailer.set("Root", catalog_id);
    merged.max_id = merged.objects.len() as u32;
    merged.renumber_objects();
    merged.adjust_zero_pages();

    if let Some(outline_id) = merged.build_outline()
        && let Ok(Object::Dictionary(dictionary)) = merged.get_object_mut(catalog_id)
    {
        dictionary.set("Outlines", Object::Reference(outline_id));
    }

    merged.compress();
    merged.save(output).map_err(|err| {
        AppError::merge(
            crate::tr!(
                "PDF の書き込みに失敗しました: {}",
                "Failed to write PDF: {}",
                output.display()
            ),
            Some(err.to_string()),
        )
    })?;
    info!("merged {} pdf files into {}", inputs.len(), output.display());
    Ok(())
}

/// A PDF is considered mergeable when it loads, is not encrypted and has at
/// least one page.
pub fn validate_pdf(path: &Path) -> bool {
    match Document::load(path) {
        Ok(doc) => !doc.is_encrypted() && !doc.get_pages().is_empty(),
        Err(err) => {
            warn!("pdf validation failed for {}: {}", path.display(), err);
            false
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfInfo {
    pub pages: usize,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub encrypted: bool,
}

pub fn pdf_info(path: &Path) -> AppResult<PdfInfo> {
    let doc = load_document(path)?;
    let info = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|object| match object {
            Object::Reference(id) => doc.get_object(*id).ok(),
            other => Some(other),
        })
        .and_then(|object| object.as_dict().ok());
    Ok(PdfInfo {
        pages: doc.get_pages().len(),
        title: info.and_then(|dict| text_entry(dict, b"Title")),
        author: info.and_then(|dict| text_entry(dict, b"Author")),
        subject: info.and_then(|dict| text_entry(dict, b"Subject")),
        creator: info.and_then(|dict| text_entry(dict, b"Creator")),
        encrypted: doc.is_encrypted(),
    })
}

fn load_document(path: &Path) -> AppResult<Document> {
    let doc = Document::load(path).map_err(|err| read_error(path, &err))?;
    if doc.is_encrypted() {
        return Err(AppError::merge(
            crate::tr!(
                "暗号化された PDF は結合できません: {}",
                "Encrypted PDFs cannot be merged: {}",
                path.display()
            ),
            Some(crate::tr!(
                "暗号化を解除してから再実行してください",
                "Decrypt the file and retry."
            )),
        ));
    }
    Ok(doc)
}

fn read_error(path: &Path, err: &lopdf::Error) -> AppError {
    AppError::merge(
        crate::tr!(
            "PDF の読み込みに失敗しました: {}",
            "Failed to read PDF: {}",
            path.display()
        ),
        Some(err.to_string()),
    )
}

fn text_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

fn object_kind(object: &Object) -> &[u8] {
    object
        .as_dict()
        .and_then(|dict| dict.get(b"Type"))
        .and_then(Object::as_name)
        .unwrap_or(b"")
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
