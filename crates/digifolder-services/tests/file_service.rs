mod common;

use common::{expired_session, session, Harness, StubRecognizer};
use digifolder_core::models::{DocumentCategory, FileType, ScannedPage, ScannedPages};
use digifolder_core::AppError;
use digifolder_storage::Storage;

#[tokio::test]
async fn text_upload_round_trip_is_byte_identical() {
    let text = "Quarterly report\nÜbersicht: 12 € ✓\n";
    let h = Harness::with_recognizer(StubRecognizer {
        fixed: Some(text.to_string()),
    })
    .await;
    let session = session();
    let photo = h.write_png("page.png", 10, 10);

    let record = h
        .service
        .upload_file(&session, &photo, FileType::Txt, "report.txt")
        .await
        .unwrap();

    assert_eq!(record.file_type, FileType::Txt);
    assert_eq!(record.size, text.len() as i64);
    assert!(record
        .storage_key
        .starts_with(&format!("{}/", session.user_id)));
    assert!(record.storage_key.ends_with("_report.txt"));

    let local = h.service.download_record(&session, &record).await.unwrap();
    assert_eq!(std::fs::read(local).unwrap(), text.as_bytes());
    assert_eq!(h.journal.pending_count(), 0);
}

#[tokio::test]
async fn mismatched_declared_type_is_accepted() {
    let h = Harness::new().await;
    let session = session();
    let photo = h.write_png("holiday.png", 4, 4);

    let record = h
        .service
        .upload_file(&session, &photo, FileType::Mp4, "holiday.mp4")
        .await
        .unwrap();

    assert_eq!(record.file_type, FileType::Mp4);
    let stored = h.storage.download(&record.storage_key).await.unwrap();
    assert_eq!(stored, std::fs::read(&photo).unwrap());
}

#[tokio::test]
async fn pdf_upload_wraps_images_and_passes_other_bytes_through() {
    let h = Harness::new().await;
    let session = session();

    let photo = h.write_png("receipt.png", 40, 60);
    let wrapped = h
        .service
        .upload_file(&session, &photo, FileType::Pdf, "receipt.pdf")
        .await
        .unwrap();
    let bytes = h.storage.download(&wrapped.storage_key).await.unwrap();
    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);

    let notes = h.write("notes.bin", b"not a picture");
    let raw = h
        .service
        .upload_file(&session, &notes, FileType::Pdf, "notes.pdf")
        .await
        .unwrap();
    assert_eq!(
        h.storage.download(&raw.storage_key).await.unwrap(),
        b"not a picture"
    );
}

#[tokio::test]
async fn csv_upload_splits_ocr_text_on_whitespace() {
    let h = Harness::with_recognizer(StubRecognizer {
        fixed: Some("Name Qty\nApple   3".to_string()),
    })
    .await;
    let session = session();
    let photo = h.write_png("sheet.png", 4, 4);

    let record = h
        .service
        .upload_file(&session, &photo, FileType::Csv, "sheet.csv")
        .await
        .unwrap();
    let stored = h.storage.download(&record.storage_key).await.unwrap();
    assert_eq!(String::from_utf8(stored).unwrap(), "Name,Qty\nApple,3");
}

#[tokio::test]
async fn empty_ocr_text_is_rejected() {
    let h = Harness::with_recognizer(StubRecognizer {
        fixed: Some("  \n".to_string()),
    })
    .await;
    let photo = h.write_png("blank.png", 4, 4);

    let err = h
        .service
        .upload_file(&session(), &photo, FileType::Txt, "blank.txt")
        .await
        .unwrap_err();
    assert!(
        matches!(err, AppError::InvalidInput(ref msg) if msg == "No text could be extracted from the image")
    );
    assert!(h.files.all().is_empty());
    assert_eq!(h.journal.pending_count(), 0);
}

#[tokio::test]
async fn missing_local_file_is_not_found() {
    let h = Harness::new().await;
    let err = h
        .service
        .upload_file(
            &session(),
            &h.dir.path().join("gone.png"),
            FileType::Png,
            "gone.png",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(ref msg) if msg == "File does not exist"));
}

#[tokio::test]
async fn expired_session_is_unauthorized() {
    let h = Harness::new().await;
    let photo = h.write_png("a.png", 4, 4);

    let err = h
        .service
        .upload_file(&expired_session(), &photo, FileType::Png, "a.png")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let err = h.service.get_files(&expired_session()).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn failed_metadata_insert_removes_uploaded_object() {
    let h = Harness::new().await;
    let session = session();
    let photo = h.write_png("a.png", 4, 4);
    h.files.set_fail_inserts(true);

    let err = h
        .service
        .upload_file(&session, &photo, FileType::Png, "a.png")
        .await;
    assert!(err.is_err());

    let user_dir = h.dir.path().join("store").join(session.user_id.to_string());
    let leftovers = std::fs::read_dir(&user_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
    assert_eq!(h.journal.pending_count(), 0);
}

#[tokio::test]
async fn failed_compensation_is_replayed_later() {
    let h = Harness::new().await;
    let session = session();
    let photo = h.write_png("a.png", 4, 4);
    h.files.set_fail_inserts(true);
    h.storage.fail_deletes_containing(Some(""));

    assert!(h
        .service
        .upload_file(&session, &photo, FileType::Png, "a.png")
        .await
        .is_err());
    assert_eq!(h.journal.pending_count(), 1);

    h.storage.fail_deletes_containing(None);
    h.files.set_fail_inserts(false);
    assert_eq!(h.service.resume_pending(&session).await.unwrap(), 1);
    assert_eq!(h.service.resume_pending(&session).await.unwrap(), 0);

    let user_dir = h.dir.path().join("store").join(session.user_id.to_string());
    assert_eq!(std::fs::read_dir(&user_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn listing_is_scoped_to_owner() {
    let h = Harness::new().await;
    let alice = session();
    let bob = session();
    let photo = h.write_png("a.png", 4, 4);

    h.service
        .upload_file(&alice, &photo, FileType::Png, "first.png")
        .await
        .unwrap();
    h.service
        .upload_file(&alice, &photo, FileType::Png, "second.png")
        .await
        .unwrap();
    h.service
        .upload_file(&bob, &photo, FileType::Png, "bob.png")
        .await
        .unwrap();

    let mut names: Vec<String> = h
        .service
        .get_files(&alice)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["first.png", "second.png"]);
}

#[tokio::test]
async fn deleting_another_users_file_touches_nothing() {
    let h = Harness::new().await;
    let alice = session();
    let mallory = session();
    let photo = h.write_png("a.png", 4, 4);
    let record = h
        .service
        .upload_file(&alice, &photo, FileType::Png, "a.png")
        .await
        .unwrap();

    let remaining = h
        .service
        .delete_files(&mallory, &[record.id])
        .await
        .unwrap();

    assert!(remaining.is_empty());
    assert_eq!(h.files.all().len(), 1);
    assert!(h.storage.exists(&record.storage_key).await.unwrap());
    assert_eq!(h.journal.pending_count(), 0);
}

#[tokio::test]
async fn delete_removes_objects_and_rows() {
    let h = Harness::new().await;
    let session = session();
    let photo = h.write_png("a.png", 4, 4);
    let keep = h
        .service
        .upload_file(&session, &photo, FileType::Png, "keep.png")
        .await
        .unwrap();
    let drop = h
        .service
        .upload_file(&session, &photo, FileType::Png, "drop.png")
        .await
        .unwrap();

    let remaining = h.service.delete_files(&session, &[drop.id]).await.unwrap();

    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep.id);
    assert!(!h.storage.exists(&drop.storage_key).await.unwrap());
    assert!(h.storage.exists(&keep.storage_key).await.unwrap());
}

#[tokio::test]
async fn concurrent_same_name_uploads_keep_separate_objects() {
    let h = Harness::new().await;
    let session = session();
    let first = h.write("first.doc", b"AAAA first document");
    let second = h.write("second.doc", b"BBBB second document");

    let (a, b) = tokio::join!(
        h.service
            .upload_file(&session, &first, FileType::Doc, "notes.doc"),
        h.service
            .upload_file(&session, &second, FileType::Doc, "notes.doc"),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.storage_key, b.storage_key);
    assert_eq!(
        h.storage.download(&a.storage_key).await.unwrap(),
        b"AAAA first document"
    );
    assert_eq!(
        h.storage.download(&b.storage_key).await.unwrap(),
        b"BBBB second document"
    );

    let remaining = h.service.delete_files(&session, &[b.id]).await.unwrap();

    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, a.id);
    assert_eq!(
        h.storage.download(&a.storage_key).await.unwrap(),
        b"AAAA first document"
    );
    assert!(!h.storage.exists(&b.storage_key).await.unwrap());
}

#[tokio::test]
async fn partial_storage_failure_then_resume_finishes_delete() {
    let h = Harness::new().await;
    let session = session();
    let photo = h.write_png("a.png", 4, 4);
    let first = h
        .service
        .upload_file(&session, &photo, FileType::Png, "first.png")
        .await
        .unwrap();
    let second = h
        .service
        .upload_file(&session, &photo, FileType::Png, "second.png")
        .await
        .unwrap();

    h.storage.fail_deletes_containing(Some("_second.png"));
    let err = h
        .service
        .delete_files(&session, &[first.id, second.id])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));

    // Rows untouched, first object already gone, second object still there.
    assert_eq!(h.files.all().len(), 2);
    assert!(!h.storage.exists(&first.storage_key).await.unwrap());
    assert!(h.storage.exists(&second.storage_key).await.unwrap());
    assert_eq!(h.journal.pending_count(), 1);

    h.storage.fail_deletes_containing(None);
    assert_eq!(h.service.resume_pending(&session).await.unwrap(), 1);

    assert!(h.files.all().is_empty());
    assert!(!h.storage.exists(&second.storage_key).await.unwrap());
    assert_eq!(h.journal.pending_count(), 0);
    assert_eq!(h.service.resume_pending(&session).await.unwrap(), 0);
}

#[tokio::test]
async fn storage_stats_sum_sizes_per_type() {
    let h = Harness::with_recognizer(StubRecognizer {
        fixed: Some("abcd".to_string()),
    })
    .await;
    let session = session();
    let photo = h.write_png("a.png", 4, 4);
    let png_size = std::fs::metadata(&photo).unwrap().len() as i64;

    h.service
        .upload_file(&session, &photo, FileType::Png, "one.png")
        .await
        .unwrap();
    h.service
        .upload_file(&session, &photo, FileType::Png, "two.png")
        .await
        .unwrap();
    h.service
        .upload_file(&session, &photo, FileType::Txt, "three.txt")
        .await
        .unwrap();

    let stats = h.service.get_storage_stats(&session).await.unwrap();
    assert_eq!(stats.total, 1024 * 1024 * 1024);
    assert_eq!(stats.used, 2 * png_size + 4);
    assert_eq!(stats.file_types.get(&FileType::Png), Some(&(2 * png_size)));
    assert_eq!(stats.file_types.get(&FileType::Txt), Some(&4));
}

#[tokio::test]
async fn multi_page_document_keeps_page_order() {
    let h = Harness::new().await;
    let session = session();
    let mut pages = ScannedPages::new();
    pages.push(ScannedPage::new(h.write_png("p1.png", 30, 40)));
    pages.push(ScannedPage::new(h.write_png("p2.png", 10, 40)));
    pages.push(ScannedPage::new(h.write_png("p3.png", 20, 40)));
    pages.move_page(2, 0).unwrap();

    let record = h
        .service
        .save_multi_page_document(&session, &pages, DocumentCategory::Document, "Scan")
        .await
        .unwrap();

    assert_eq!(record.name, "Scan.pdf");
    assert_eq!(record.file_type, FileType::Pdf);

    let bytes = h.storage.download(&record.storage_key).await.unwrap();
    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    let widths: Vec<i64> = doc
        .get_pages()
        .values()
        .map(|page_id| {
            let page = doc.get_dictionary(*page_id).unwrap();
            let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
            let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
            let image_id = xobjects.get(b"Im1").unwrap().as_reference().unwrap();
            let stream = doc.get_object(image_id).unwrap().as_stream().unwrap();
            stream.dict.get(b"Width").unwrap().as_i64().unwrap()
        })
        .collect();
    assert_eq!(widths, vec![20, 30, 10]);
}

#[tokio::test]
async fn multi_page_text_joins_pages_with_blank_lines() {
    let h = Harness::new().await;
    let session = session();
    let mut pages = ScannedPages::new();
    pages.push(ScannedPage::new(h.write_png("intro.png", 4, 4)));
    pages.push(ScannedPage::new(h.write_png("body.png", 4, 4)));

    let record = h
        .service
        .save_multi_page_document(&session, &pages, DocumentCategory::Text, "Notes")
        .await
        .unwrap();

    assert_eq!(record.name, "Notes.txt");
    assert_eq!(record.file_type, FileType::Txt);
    let stored = h.storage.download(&record.storage_key).await.unwrap();
    assert_eq!(
        String::from_utf8(stored).unwrap(),
        "text of intro\n\ntext of body"
    );
}

#[tokio::test]
async fn multi_page_ocr_failure_fails_the_batch() {
    let h = Harness::new().await;
    let session = session();
    let mut pages = ScannedPages::new();
    pages.push(ScannedPage::new(h.write_png("intro.png", 4, 4)));
    pages.push(ScannedPage::new(h.dir.path().join("missing.png")));

    let err = h
        .service
        .save_multi_page_document(&session, &pages, DocumentCategory::Text, "Notes")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(h.files.all().is_empty());
}

#[tokio::test]
async fn multi_page_other_types_are_unsupported() {
    let h = Harness::new().await;
    let mut pages = ScannedPages::new();
    pages.push(ScannedPage::new(h.write_png("p.png", 4, 4)));

    let err = h
        .service
        .save_multi_page_document(&session(), &pages, DocumentCategory::Spreadsheet, "x")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(ref msg) if msg == "Unsupported document type"));
}

#[tokio::test]
async fn download_file_fetches_into_cache() {
    let mut server = mockito::Server::new_async().await;
    let ok = server
        .mock("GET", "/files/report.pdf")
        .with_status(200)
        .with_body("%PDF-1.5 fake")
        .create_async()
        .await;
    server
        .mock("GET", "/files/missing.pdf")
        .with_status(404)
        .create_async()
        .await;

    let h = Harness::new().await;
    let path = h
        .service
        .download_file(&format!("{}/files/report.pdf", server.url()), "report.pdf")
        .await
        .unwrap();
    ok.assert_async().await;
    assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.5 fake");
    assert!(path.starts_with(h.dir.path().join("cache")));

    let err = h
        .service
        .download_file(&format!("{}/files/missing.pdf", server.url()), "missing.pdf")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Remote(_)));
}

#[tokio::test]
async fn download_record_of_another_user_is_not_found() {
    let h = Harness::new().await;
    let owner = session();
    let photo = h.write_png("a.png", 4, 4);
    let record = h
        .service
        .upload_file(&owner, &photo, FileType::Png, "a.png")
        .await
        .unwrap();

    let err = h
        .service
        .download_record(&session(), &record)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
