use serde::{Deserialize, Serialize};

/// Result codes the server attaches to every response payload.
pub mod codes {
    pub const SUCCESS: i32 = 0;
    pub const FOLDER_EXISTS: i32 = 12;
    pub const NO_PERMISSION: i32 = 103;
}

/// One raw record from a listing page. A record carries file metadata,
/// folder metadata, or neither (the server pads pages with filler records).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawEntry {
    #[serde(default)]
    pub file: Option<FileRecord>,
    #[serde(default)]
    pub folder: Option<FolderRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub md5: String,
    pub sha1: String,
    pub upload_time: i64,
    pub modified_time: i64,
    #[serde(default)]
    pub expiry_time: i64,
    pub uploader_id: u64,
    pub bus_id: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FolderRecord {
    pub id: String,
    pub name: String,
    pub create_time: i64,
    pub modified_time: i64,
    pub creator_id: u64,
    pub total_count: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListChildrenResponse {
    pub result_code: i32,
    #[serde(default)]
    pub items: Vec<RawEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateFolderResponse {
    pub result_code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub folder: Option<FolderRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NegotiateUploadResponse {
    pub result_code: i32,
    #[serde(default)]
    pub message: String,
    pub file_id: String,
    pub bus_id: i32,
    /// Server already holds content with the offered digests; no transfer needed.
    pub exists: bool,
    #[serde(default)]
    pub check_key: Vec<u8>,
    #[serde(default)]
    pub lan_addrs: Vec<HostPort>,
    #[serde(default)]
    pub public_addr: Option<HostPort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HostPort {
    pub host: String,
    pub port: u16,
}

impl std::fmt::Display for HostPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_entry_defaults_to_filler() {
        let entry: RawEntry = serde_json::from_str("{}").unwrap();
        assert!(entry.file.is_none());
        assert!(entry.folder.is_none());
    }

    #[test]
    fn negotiate_response_roundtrips_addresses() {
        let resp = NegotiateUploadResponse {
            result_code: codes::SUCCESS,
            message: String::new(),
            file_id: "f-9".into(),
            bus_id: 7,
            exists: false,
            check_key: vec![1, 2, 3],
            lan_addrs: vec![HostPort {
                host: "10.0.0.5".into(),
                port: 8000,
            }],
            public_addr: Some(HostPort {
                host: "203.0.113.4".into(),
                port: 443,
            }),
        };
        let json = serde_json::to_string(&resp).unwrap();
        let back: NegotiateUploadResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back.lan_addrs, resp.lan_addrs);
        assert_eq!(back.public_addr, resp.public_addr);
        assert_eq!(back.lan_addrs[0].to_string(), "10.0.0.5:8000");
    }
}
