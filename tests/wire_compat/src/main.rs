fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use imgdrop_protocol::{
        DeleteRequest, DeleteResponse, ErrorResponse, PresignRequest, PresignResponse,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent comparison).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  web:  {fixture}\n  Rust: {reserialized}"
        );
        parsed
    }

    #[test]
    fn fixture_presign_request() {
        let req: PresignRequest = roundtrip_test("presign_request.json");
        assert_eq!(req.filename, "holiday photo.png");
        assert_eq!(req.content_type, "image/png");
        assert_eq!(req.size, 1_048_576);
    }

    #[test]
    fn fixture_presign_response() {
        let resp: PresignResponse = roundtrip_test("presign_response.json");
        assert_eq!(resp.key, "uploads/3f2a9c1e-holiday photo.png");
        assert!(resp.presigned_url.contains("X-Amz-Signature"));
    }

    #[test]
    fn fixture_delete_request() {
        let req: DeleteRequest = roundtrip_test("delete_request.json");
        assert_eq!(req.key, "uploads/3f2a9c1e-holiday photo.png");
    }

    #[test]
    fn fixture_delete_response() {
        let resp: DeleteResponse = roundtrip_test("delete_response.json");
        assert_eq!(resp.message, "File deleted successfully");
    }

    #[test]
    fn fixture_error_response() {
        let resp: ErrorResponse = roundtrip_test("error_response.json");
        assert_eq!(resp.error, "File key is required");
    }

    #[test]
    fn presign_request_uses_camel_case_keys() {
        let fixture = load_fixture("presign_request.json");
        let obj = fixture.as_object().unwrap();
        assert!(obj.contains_key("contentType"));
        assert!(!obj.contains_key("content_type"));
    }
}
