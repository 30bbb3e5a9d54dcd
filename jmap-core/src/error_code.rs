//! Method-level error codes
//!
//! The table below covers the codes defined by JMAP Core, JMAP Mail and
//! email submission. Each entry's doc comment is also the text returned by
//! [`ErrorCode::description`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! error_codes {
    ($( $(#[doc = $doc:literal])+ $variant:ident => $code:literal, )+) => {
        /// Error code carried in the `type` field of a method error
        ///
        /// Codes not in this table are preserved in [`ErrorCode::Other`] so
        /// that extension codes round-trip unchanged.
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum ErrorCode {
            $( $(#[doc = $doc])+ $variant, )+
            /// A code this library does not know.
            Other(String),
        }

        impl ErrorCode {
            /// Every known code, in table order.
            pub const ALL: &'static [ErrorCode] = &[ $( ErrorCode::$variant, )+ ];

            /// Wire form of the code.
            pub fn as_str(&self) -> &str {
                match self {
                    $( ErrorCode::$variant => $code, )+
                    ErrorCode::Other(code) => code,
                }
            }

            /// Authoritative description of the code, `None` for unknown codes.
            pub fn description(&self) -> Option<&'static str> {
                match self {
                    $( ErrorCode::$variant => Some(concat!($($doc),+).trim_start()), )+
                    ErrorCode::Other(_) => None,
                }
            }
        }

        impl From<&str> for ErrorCode {
            fn from(code: &str) -> Self {
                match code {
                    $( $code => ErrorCode::$variant, )+
                    other => ErrorCode::Other(other.to_string()),
                }
            }
        }
    };
}

error_codes! {
    /// The accountId does not correspond to a valid account.
    AccountNotFound => "accountNotFound",
    /// The accountId given corresponds to a valid account, but the account does
    /// not support this method or data type.
    AccountNotSupportedByMethod => "accountNotSupportedByMethod",
    /// This method call would modify state in an account that is read-only (as
    /// returned on the corresponding Account object in the JMAP Session resource).
    AccountReadOnly => "accountReadOnly",
    /// An anchor argument was supplied, but it cannot be found in the results of
    /// the query.
    AnchorNotFound => "anchorNotFound",
    /// The server forbids duplicates and the record already exists in the target
    /// account. An existingId property of type Id MUST be included on the error
    /// object with the id of the existing record.
    AlreadyExists => "alreadyExists",
    /// The server cannot calculate the changes from the state string given by the
    /// client.
    CannotCalculateChanges => "cannotCalculateChanges",
    /// The action would violate an ACL or other permissions policy.
    Forbidden => "forbidden",
    /// The fromAccountId does not correspond to a valid account.
    FromAccountNotFound => "fromAccountNotFound",
    /// The fromAccountId given corresponds to a valid account, but the account
    /// does not support this data type.
    FromAccountNotSupportedByMethod => "fromAccountNotSupportedByMethod",
    /// One of the arguments is of the wrong type or otherwise invalid, or a
    /// required argument is missing.
    InvalidArguments => "invalidArguments",
    /// The PatchObject given to update the record was not a valid patch.
    InvalidPatch => "invalidPatch",
    /// The record given is invalid.
    InvalidProperties => "invalidProperties",
    /// The id given cannot be found.
    NotFound => "notFound",
    /// The content type of the request was not application/json or the request did
    /// not parse as I-JSON.
    NotJson => "notJSON",
    /// The request parsed as JSON but did not match the type signature of the
    /// Request object.
    NotRequest => "notRequest",
    /// The create would exceed a server-defined limit on the number or total size
    /// of objects of this type.
    OverQuota => "overQuota",
    /// Too many objects of this type have been created recently, and a
    /// server-defined rate limit has been reached. It may work if tried again
    /// later.
    RateLimit => "rateLimit",
    /// The total number of actions exceeds the maximum number the server is
    /// willing to process in a single method call.
    RequestTooLarge => "requestTooLarge",
    /// The method used a result reference for one of its arguments, but this
    /// failed to resolve.
    InvalidResultReference => "invalidResultReference",
    /// An unexpected or unknown error occurred during the processing of the call.
    /// The method call made no changes to the server's state.
    ServerFail => "serverFail",
    /// Some, but not all expected changes described by the method occurred. The
    /// client MUST re-synchronise impacted data to determine server state. Use of
    /// this error is strongly discouraged.
    ServerPartialFail => "serverPartialFail",
    /// Some internal server resource was temporarily unavailable. Attempting the
    /// same operation later (perhaps after a backoff with a random factor) may
    /// succeed.
    ServerUnavailable => "serverUnavailable",
    /// This is a singleton type, so you cannot create another one or destroy the
    /// existing one.
    Singleton => "singleton",
    /// An ifInState argument was supplied and it does not match the current state.
    StateMismatch => "stateMismatch",
    /// The action would result in an object that exceeds a server-defined limit
    /// for the maximum size of a single object of this type.
    TooLarge => "tooLarge",
    /// There are more changes than the client's maxChanges argument.
    TooManyChanges => "tooManyChanges",
    /// The client included a capability in the "using" property of the request
    /// that the server does not support.
    UnknownCapability => "unknownCapability",
    /// The server does not recognise this method name.
    UnknownMethod => "unknownMethod",
    /// The filter is syntactically valid, but the server cannot process it.
    UnsupportedFilter => "unsupportedFilter",
    /// The sort is syntactically valid, but includes a property the server does
    /// not support sorting on, or a collation method it does not recognise.
    UnsupportedSort => "unsupportedSort",
    /// The client requested an object be both updated and destroyed in the same
    /// /set request, and the server has decided to therefore ignore the update.
    WillDestroy => "willDestroy",
    /// The mailbox still has at least one child mailbox. The client MUST remove
    /// these before it can delete the parent mailbox.
    MailboxHasChild => "mailboxHasChild",
    /// The mailbox has at least one message assigned to it and the
    /// onDestroyRemoveMessages argument was false.
    MailboxHasEmail => "mailboxHasEmail",
    /// At least one blob id referenced in the object doesn't exist.
    BlobNotFound => "blobNotFound",
    /// The change to the email's keywords would exceed a server-defined maximum.
    TooManyKeywords => "tooManyKeywords",
    /// The change to the email's mailboxes would exceed a server-defined maximum.
    TooManyMailboxes => "tooManyMailboxes",
    /// The email to be sent is invalid in some way.
    InvalidEmail => "invalidEmail",
    /// The [RFC5321] envelope (supplied or generated) has more recipients than the
    /// server allows.
    TooManyRecipients => "tooManyRecipients",
    /// The [RFC5321] envelope (supplied or generated) does not have any rcptTo
    /// emails.
    NoRecipients => "noRecipients",
    /// The rcptTo property of the [RFC5321] envelope (supplied or generated)
    /// contains at least one rcptTo value which is not a valid email for sending
    /// to.
    InvalidRecipients => "invalidRecipients",
    /// The server does not permit the user to send an email with the [RFC5321]
    /// envelope From.
    ForbiddenMailFrom => "forbiddenMailFrom",
    /// The server does not permit the user to send an email with the [RFC5322]
    /// From header field of the email to be sent.
    ForbiddenFrom => "forbiddenFrom",
    /// The user does not have permission to send at all right now.
    ForbiddenToSend => "forbiddenToSend",
}

impl FromStr for ErrorCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ErrorCode::from(s))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(ErrorCode::from(code.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_round_trip() {
        assert_eq!(ErrorCode::ALL.len(), 43);
        for code in ErrorCode::ALL {
            assert_eq!(&ErrorCode::from(code.as_str()), code);
            assert!(code.description().is_some());
        }
    }

    #[test]
    fn test_unknown_code_preserved() {
        let code: ErrorCode = "calendarEventNotFound".parse().unwrap();
        assert_eq!(code, ErrorCode::Other("calendarEventNotFound".into()));
        assert_eq!(code.as_str(), "calendarEventNotFound");
        assert_eq!(code.description(), None);
    }

    #[test]
    fn test_description_joins_lines() {
        assert_eq!(
            ErrorCode::AccountNotFound.description(),
            Some("The accountId does not correspond to a valid account.")
        );
        assert_eq!(
            ErrorCode::CannotCalculateChanges.description(),
            Some("The server cannot calculate the changes from the state string given by the client.")
        );
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&ErrorCode::NotJson).unwrap();
        assert_eq!(json, r#""notJSON""#);

        let code: ErrorCode = serde_json::from_str(r#""willDestroy""#).unwrap();
        assert_eq!(code, ErrorCode::WillDestroy);
    }
}
