use crate::constants::CSV_ID_HEADER;
use crate::models::RecordId;

/// Single-column delete payload: `Id` header, one id per line, LF endings,
/// no trailing newline
pub fn encode_delete_payload(ids: &[RecordId]) -> String {
    let capacity = CSV_ID_HEADER.len() + ids.iter().map(|id| id.len() + 1).sum::<usize>();
    let mut csv = String::with_capacity(capacity);
    csv.push_str(CSV_ID_HEADER);
    for id in ids {
        csv.push('\n');
        csv.push_str(id);
    }
    csv
}
