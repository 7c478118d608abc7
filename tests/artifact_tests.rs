use anonsend::session::artifact::{sanitize_file_name, save_artifact};
use anonsend::session::{ResultArtifact, ResultMetadata};
use tempfile::TempDir;

#[test]
fn metadata_parses_from_the_wire_shape() {
    let metadata: ResultMetadata =
        serde_json::from_str(r#"{"fileName":"2024-06-01_12-00-00.zip","fileType":"application/zip"}"#)
            .unwrap();
    assert_eq!(metadata.file_name, "2024-06-01_12-00-00.zip");
    assert_eq!(metadata.file_type, "application/zip");
}

#[test]
fn server_supplied_names_are_reduced_to_a_basename() {
    assert_eq!(sanitize_file_name("result.zip"), "result.zip");
    assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
    assert_eq!(sanitize_file_name("a/b/c.zip"), "c.zip");
    assert_eq!(sanitize_file_name("C:\\share\\y.zip"), "y.zip");
    assert_eq!(sanitize_file_name("nul\0byte.zip"), "nulbyte.zip");
    assert_eq!(sanitize_file_name(""), "result.zip");
    assert_eq!(sanitize_file_name(".."), "result.zip");
    assert_eq!(sanitize_file_name("   "), "result.zip");
}

#[tokio::test]
async fn save_writes_the_bytes_under_the_advertised_name() {
    let dir = TempDir::new().unwrap();
    let artifact = ResultArtifact {
        metadata: ResultMetadata {
            file_name: "anonymized.zip".to_string(),
            file_type: "application/zip".to_string(),
        },
        bytes: b"zip-bytes".to_vec(),
    };

    let path = save_artifact(dir.path(), &artifact).await.unwrap();
    assert_eq!(path, dir.path().join("anonymized.zip"));
    assert_eq!(std::fs::read(&path).unwrap(), b"zip-bytes");
}

#[tokio::test]
async fn save_creates_the_output_directory_and_ignores_traversal() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("results").join("today");
    let artifact = ResultArtifact {
        metadata: ResultMetadata {
            file_name: "../../escape.zip".to_string(),
            file_type: "application/zip".to_string(),
        },
        bytes: b"x".to_vec(),
    };

    let path = save_artifact(&out, &artifact).await.unwrap();
    assert_eq!(path, out.join("escape.zip"));
    assert!(path.is_file());
}
