use logicrom_image::{finalize, finalize_file, ImageError, IMAGE_ALIGN, MIN_IMAGE_LEN};
use proptest::prelude::*;

proptest! {
    #[test]
    fn output_is_block_aligned(raw in proptest::collection::vec(any::<u8>(), MIN_IMAGE_LEN..4096)) {
        let image = finalize(&raw).unwrap();
        prop_assert_eq!(image.as_bytes().len() % IMAGE_ALIGN, 0);
        prop_assert!(image.as_bytes().len() >= raw.len());
        prop_assert!(image.as_bytes().len() - raw.len() < IMAGE_ALIGN);
        if raw.len() % IMAGE_ALIGN == 0 {
            prop_assert_eq!(image.as_bytes().len(), raw.len());
        }
    }

    #[test]
    fn padding_is_zero_and_body_is_untouched(raw in proptest::collection::vec(any::<u8>(), MIN_IMAGE_LEN..4096)) {
        let image = finalize(&raw).unwrap();
        let bytes = image.as_bytes();
        prop_assert!(bytes[raw.len()..].iter().all(|&b| b == 0));
        prop_assert_eq!(&bytes[..4], &raw[..4]);
        prop_assert_eq!(&bytes[12..raw.len()], &raw[12..]);
    }

    #[test]
    fn header_declares_final_length(raw in proptest::collection::vec(any::<u8>(), MIN_IMAGE_LEN..4096)) {
        let image = finalize(&raw).unwrap();
        prop_assert_eq!(image.declared_size() as usize, image.as_bytes().len());
    }

    #[test]
    fn checksum_covers_buffer_before_crc_patch(raw in proptest::collection::vec(any::<u8>(), MIN_IMAGE_LEN..4096)) {
        let image = finalize(&raw).unwrap();

        let mut expected = image.as_bytes().to_vec();
        expected[8..12].copy_from_slice(&raw[8..12]);
        prop_assert_eq!(image.checksum(), crc32fast::hash(&expected));
    }

    #[test]
    fn finalize_is_deterministic(raw in proptest::collection::vec(any::<u8>(), MIN_IMAGE_LEN..1024)) {
        prop_assert_eq!(finalize(&raw).unwrap(), finalize(&raw).unwrap());
    }
}

#[test]
fn exactly_one_block_only_rewrites_header_fields() {
    let raw = vec![0x5a; 128];
    let image = finalize(&raw).unwrap();

    assert_eq!(image.as_bytes().len(), 128);
    assert_eq!(&image.as_bytes()[4..8], &128u32.to_le_bytes());
    for (i, (&out, &inp)) in image.as_bytes().iter().zip(&raw).enumerate() {
        if !(4..12).contains(&i) {
            assert_eq!(out, inp, "byte {i} changed");
        }
    }
}

#[test]
fn finalize_file_rewrites_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("firmware.img");
    std::fs::write(&path, [0u8; 16]).unwrap();

    let image = finalize_file(&path).unwrap();

    let on_disk = std::fs::read(&path).unwrap();
    assert_eq!(on_disk.len(), 128);
    assert_eq!(on_disk, image.as_bytes());
    assert_eq!(&on_disk[8..12], &0x7484_7e7cu32.to_le_bytes());
}

#[test]
fn finalize_file_reports_short_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.img");
    std::fs::write(&path, [0u8; 8]).unwrap();

    assert!(matches!(finalize_file(&path), Err(ImageError::InvalidInput { len: 8 })));
    assert_eq!(std::fs::read(&path).unwrap().len(), 8);
}

#[test]
fn finalize_file_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.img");

    match finalize_file(&path) {
        Err(ImageError::Io { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected Io error, got {other:?}"),
    }
}
