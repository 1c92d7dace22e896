//! The numeric error-code registry and HTTP status mapping the envelope's
//! `errors[].error_number` carries on the wire (spec §4.E/§6/§7).

use slurmrest_codec::JsonErrorKind;
use slurmrest_core::convert::ConvertError;
use slurmrest_core::path::PathError;
use slurmrest_core::value::TypeMismatch;

/// A stable numeric error code plus the broad class (client/domain/
/// backend/fatal) it belongs to, per spec §7.
///
/// The numeric values are assigned once here and never renumbered —
/// they are part of this crate's wire contract in the same sense spec §6
/// describes for the original registry. The retrieved reference material
/// did not include the original numeric assignments (`slurm_errno.h` was
/// not part of the indexed source), so this registry starts its own
/// stable numbering rather than guessing at numbers it cannot verify;
/// see `DESIGN.md`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed or unsupported query parameters.
    InvalidQuery,
    /// [`slurmrest_core::path::resolve_path`] found nothing at the
    /// requested path.
    DataPathNotFound,
    /// A data-parser expected a `Dict` node and found something else.
    DataExpectedDict,
    /// A data-parser expected a `List` node and found something else.
    DataExpectedList,
    /// [`slurmrest_core::convert::convert`] failed.
    DataConvFailed,
    /// A modify request matched more than one record when exactly one
    /// was required.
    AmbiguousModify,
    /// A query matched more than one record when the endpoint requires
    /// exactly one.
    AmbiguousQuery,
    /// A backend query succeeded but returned no rows, where the
    /// endpoint treats that as a failure rather than an empty body.
    EmptyResult,
    /// The composite job id in the path failed to parse.
    InvalidJobId,
    /// The partition name in the path does not exist.
    InvalidPartitionName,
    /// The reservation name in the path does not exist.
    ReservationInvalid,
    /// The request asked for functionality this build does not provide
    /// (e.g. TRES update when disabled).
    NotSupported,
    /// A forbidden codepoint or malformed UTF-8 sequence was rejected.
    UtfEncodingViolation,
    /// A JSON body failed to parse; carries the codec's specific kind.
    JsonParse(JsonErrorKind),
    /// A URL-encoded form body failed to parse.
    UrlFormParse,
    /// The requested job/node/partition/account/user/etc. does not
    /// exist.
    UnknownEntity,
    /// The job has already completed and cannot be signaled/modified.
    JobAlreadyDone,
    /// The job is held and the requested action cannot proceed.
    JobHeld,
    /// A QOS preemption-loop check rejected the request.
    PreemptionLoop,
    /// No license of the requested type is available.
    LicenseUnavailable,
    /// The backend connection could not be established or was lost.
    DbConnection,
    /// The backend RPC returned a non-zero code this registry does not
    /// otherwise classify.
    BackendRpcFailed,
    /// JSON/data-tree nesting exceeded the depth limit.
    RecursionDepthExceeded,
    /// The request body began with a UTF-16/UTF-32 byte-order mark.
    Utf16Or32Body,
    /// The request used an HTTP method the endpoint does not support.
    UnsupportedMethod,
}

/// The broad error class spec §7 groups [`ErrorKind`]s into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 400-class: malformed input the client sent.
    Client,
    /// 400/404-class: a well-formed request referring to domain state
    /// that doesn't permit it.
    Domain,
    /// 500-class: the backend failed.
    Backend,
    /// Request-fatal: terminates this request, not the process.
    Fatal,
}

impl ErrorKind {
    /// This error's stable numeric wire code.
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::InvalidQuery => 1001,
            Self::DataPathNotFound => 1002,
            Self::DataExpectedDict => 1003,
            Self::DataExpectedList => 1004,
            Self::DataConvFailed => 1005,
            Self::AmbiguousModify => 1006,
            Self::AmbiguousQuery => 1007,
            Self::EmptyResult => 1008,
            Self::InvalidJobId => 1009,
            Self::InvalidPartitionName => 1010,
            Self::ReservationInvalid => 1011,
            Self::NotSupported => 1012,
            Self::UtfEncodingViolation => 1013,
            Self::JsonParse(_) => 1014,
            Self::UrlFormParse => 1015,
            Self::UnknownEntity => 2001,
            Self::JobAlreadyDone => 2002,
            Self::JobHeld => 2003,
            Self::PreemptionLoop => 2004,
            Self::LicenseUnavailable => 2005,
            Self::DbConnection => 3001,
            Self::BackendRpcFailed => 3002,
            Self::RecursionDepthExceeded => 4001,
            Self::Utf16Or32Body => 4002,
            Self::UnsupportedMethod => 4003,
        }
    }

    /// This error's class, per spec §7.
    #[must_use]
    pub fn class(self) -> ErrorClass {
        match self {
            Self::InvalidQuery
            | Self::DataPathNotFound
            | Self::DataExpectedDict
            | Self::DataExpectedList
            | Self::DataConvFailed
            | Self::AmbiguousModify
            | Self::AmbiguousQuery
            | Self::EmptyResult
            | Self::InvalidJobId
            | Self::InvalidPartitionName
            | Self::ReservationInvalid
            | Self::NotSupported
            | Self::UtfEncodingViolation
            | Self::JsonParse(_)
            | Self::UrlFormParse => ErrorClass::Client,
            Self::UnknownEntity
            | Self::JobAlreadyDone
            | Self::JobHeld
            | Self::PreemptionLoop
            | Self::LicenseUnavailable => ErrorClass::Domain,
            Self::DbConnection | Self::BackendRpcFailed => ErrorClass::Backend,
            Self::RecursionDepthExceeded | Self::Utf16Or32Body | Self::UnsupportedMethod => {
                ErrorClass::Fatal
            }
        }
    }

    /// The HTTP status class this error maps to, per spec §7 ("client
    /// errors map to 4xx, backend errors to 5xx").
    #[must_use]
    pub fn http_status(self) -> u16 {
        match self.class() {
            ErrorClass::Client | ErrorClass::Fatal => match self {
                Self::DataPathNotFound
                | Self::UnknownEntity
                | Self::InvalidPartitionName
                | Self::ReservationInvalid => 404,
                Self::UnsupportedMethod => 405,
                _ => 400,
            },
            ErrorClass::Domain => 409,
            ErrorClass::Backend => 503,
        }
    }

    /// The process exit code a CLI wrapping this core should use when
    /// startup fails with this error class, per spec §6 "Exit codes".
    #[must_use]
    pub fn exit_code(self) -> u8 {
        match self.class() {
            ErrorClass::Client => 64,  // EX_USAGE
            ErrorClass::Backend => 69, // EX_UNAVAILABLE
            ErrorClass::Domain | ErrorClass::Fatal => 70, // EX_SOFTWARE
        }
    }

    /// A short machine-stable name, used as the envelope's `error` field.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::InvalidQuery => "INVALID_QUERY",
            Self::DataPathNotFound => "DATA_PATH_NOT_FOUND",
            Self::DataExpectedDict => "DATA_EXPECTED_DICT",
            Self::DataExpectedList => "DATA_EXPECTED_LIST",
            Self::DataConvFailed => "DATA_CONV_FAILED",
            Self::AmbiguousModify => "AMBIGUOUS_MODIFY",
            Self::AmbiguousQuery => "AMBIGUOUS_QUERY",
            Self::EmptyResult => "EMPTY_RESULT",
            Self::InvalidJobId => "INVALID_JOB_ID",
            Self::InvalidPartitionName => "INVALID_PARTITION_NAME",
            Self::ReservationInvalid => "RESERVATION_INVALID",
            Self::NotSupported => "NOT_SUPPORTED",
            Self::UtfEncodingViolation => "UTF_ENCODING_VIOLATION",
            Self::JsonParse(_) => "JSON_PARSE_ERROR",
            Self::UrlFormParse => "URL_FORM_PARSE_ERROR",
            Self::UnknownEntity => "UNKNOWN_ENTITY",
            Self::JobAlreadyDone => "JOB_ALREADY_DONE",
            Self::JobHeld => "JOB_HELD",
            Self::PreemptionLoop => "PREEMPTION_LOOP",
            Self::LicenseUnavailable => "LICENSE_UNAVAILABLE",
            Self::DbConnection => "DB_CONNECTION",
            Self::BackendRpcFailed => "BACKEND_RPC_FAILED",
            Self::RecursionDepthExceeded => "RECURSION_DEPTH_EXCEEDED",
            Self::Utf16Or32Body => "UTF16_OR_32_BODY",
            Self::UnsupportedMethod => "UNSUPPORTED_METHOD",
        }
    }
}

impl From<TypeMismatch> for ErrorKind {
    fn from(_: TypeMismatch) -> Self {
        Self::DataExpectedDict
    }
}

impl From<PathError> for ErrorKind {
    fn from(_: PathError) -> Self {
        Self::DataPathNotFound
    }
}

impl From<ConvertError> for ErrorKind {
    fn from(_: ConvertError) -> Self {
        Self::DataConvFailed
    }
}

impl From<JsonErrorKind> for ErrorKind {
    fn from(kind: JsonErrorKind) -> Self {
        match kind {
            JsonErrorKind::ParseDepthMax | JsonErrorKind::ParseDepthMin => {
                Self::RecursionDepthExceeded
            }
            JsonErrorKind::Utf16BeSchema
            | JsonErrorKind::Utf16LeSchema
            | JsonErrorKind::Utf32BeSchema
            | JsonErrorKind::Utf32LeSchema => Self::Utf16Or32Body,
            other => Self::JsonParse(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let all = [
            ErrorKind::InvalidQuery,
            ErrorKind::DataPathNotFound,
            ErrorKind::DataExpectedDict,
            ErrorKind::DataExpectedList,
            ErrorKind::DataConvFailed,
            ErrorKind::AmbiguousModify,
            ErrorKind::AmbiguousQuery,
            ErrorKind::EmptyResult,
            ErrorKind::InvalidJobId,
            ErrorKind::InvalidPartitionName,
            ErrorKind::ReservationInvalid,
            ErrorKind::NotSupported,
            ErrorKind::UtfEncodingViolation,
            ErrorKind::UrlFormParse,
            ErrorKind::UnknownEntity,
            ErrorKind::JobAlreadyDone,
            ErrorKind::JobHeld,
            ErrorKind::PreemptionLoop,
            ErrorKind::LicenseUnavailable,
            ErrorKind::DbConnection,
            ErrorKind::BackendRpcFailed,
            ErrorKind::RecursionDepthExceeded,
            ErrorKind::Utf16Or32Body,
            ErrorKind::UnsupportedMethod,
        ];
        let mut codes: Vec<i64> = all.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        let mut deduped = codes.clone();
        deduped.dedup();
        assert_eq!(codes, deduped);
    }

    #[test]
    fn client_errors_map_to_4xx_backend_to_5xx() {
        assert_eq!(ErrorKind::InvalidQuery.http_status(), 400);
        assert_eq!(ErrorKind::DataPathNotFound.http_status(), 404);
        assert_eq!(ErrorKind::DbConnection.http_status(), 503);
        assert_eq!(ErrorKind::UnknownEntity.http_status(), 409);
    }

    #[test]
    fn exit_codes_follow_class() {
        assert_eq!(ErrorKind::InvalidQuery.exit_code(), 64);
        assert_eq!(ErrorKind::DbConnection.exit_code(), 69);
        assert_eq!(ErrorKind::RecursionDepthExceeded.exit_code(), 70);
    }
}
