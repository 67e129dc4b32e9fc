use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where a running function lives, derived from its own invoked ARN.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionIdentity {
    pub region: String,
    pub account_id: String,
    pub function_name: String,
    pub qualifier: Option<String>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ArnParseError {
    #[error("expected 7 or 8 colon separated segments, found {found}")]
    SegmentCount { found: usize },
    #[error("identifier does not start with 'arn'")]
    NotAnArn,
    #[error("expected the lambda service, found '{0}'")]
    WrongService(String),
    #[error("expected a function resource, found '{0}'")]
    WrongResourceType(String),
    #[error("the {0} segment is empty")]
    EmptySegment(&'static str),
    #[error("account id '{0}' is not numeric")]
    InvalidAccountId(String),
}

/// Parses `arn:<partition>:lambda:<region>:<account>:function:<name>[:<qualifier>]`.
///
/// Nothing is returned unless every segment checks out.
pub fn parse_lambda_func_arn(arn: &str) -> Result<FunctionIdentity, ArnParseError> {
    let segments: Vec<&str> = arn.trim().split(':').collect();
    if !(7..=8).contains(&segments.len()) {
        return Err(ArnParseError::SegmentCount {
            found: segments.len(),
        });
    }

    if segments[0] != "arn" {
        return Err(ArnParseError::NotAnArn);
    }
    non_empty(segments[1], "partition")?;
    if segments[2] != "lambda" {
        return Err(ArnParseError::WrongService(segments[2].to_string()));
    }
    let region = non_empty(segments[3], "region")?;
    let account_id = non_empty(segments[4], "account")?;
    if !account_id.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ArnParseError::InvalidAccountId(account_id.to_string()));
    }
    if segments[5] != "function" {
        return Err(ArnParseError::WrongResourceType(segments[5].to_string()));
    }
    let function_name = non_empty(segments[6], "function name")?;
    let qualifier = segments
        .get(7)
        .copied()
        .map(|qualifier| non_empty(qualifier, "qualifier"))
        .transpose()?;

    Ok(FunctionIdentity {
        region: region.to_string(),
        account_id: account_id.to_string(),
        function_name: function_name.to_string(),
        qualifier: qualifier.map(str::to_string),
    })
}

fn non_empty<'a>(segment: &'a str, name: &'static str) -> Result<&'a str, ArnParseError> {
    if segment.is_empty() {
        return Err(ArnParseError::EmptySegment(name));
    }
    Ok(segment)
}

impl FromStr for FunctionIdentity {
    type Err = ArnParseError;

    fn from_str(arn: &str) -> Result<Self, Self::Err> {
        parse_lambda_func_arn(arn)
    }
}
