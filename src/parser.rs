use crate::ast::{Pipeline, Stage};
use crate::error::SyntaxError;
use crate::redirect::{OutputMode, Redirections};

const PIPE: &str = "|";
const BACKGROUND: &str = "&";
const INPUT: &str = "<";
const TRUNCATE: &str = ">";
const APPEND: &str = ">>";

/// Split a raw line into words on runs of whitespace.
///
/// There is no quoting, escaping, or comment syntax: every non-blank run of
/// characters is one token, including the operators.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Group tokens into pipeline stages.
///
/// Redirection and background operators are only recognised in the final
/// stage. Empty stages are dropped, so a line of only `|` tokens yields an
/// empty pipeline, which callers treat as a no-op.
pub fn build<'a>(tokens: &[&'a str]) -> Result<Pipeline<'a>, SyntaxError> {
    let segments: Vec<&[&'a str]> = tokens.split(|token| *token == PIPE).collect();
    let last = segments.len().saturating_sub(1);
    let mut pipeline = Pipeline::default();

    for (index, segment) in segments.into_iter().enumerate() {
        let stage = if index == last {
            final_stage(segment, &mut pipeline.background)?
        } else {
            inner_stage(segment)?
        };
        if let Some(stage) = stage {
            pipeline.stages.push(stage);
        }
    }

    Ok(pipeline)
}

fn operator(token: &str) -> Option<&'static str> {
    match token {
        PIPE => Some(PIPE),
        BACKGROUND => Some(BACKGROUND),
        INPUT => Some(INPUT),
        TRUNCATE => Some(TRUNCATE),
        APPEND => Some(APPEND),
        _ => None,
    }
}

fn inner_stage<'a>(segment: &[&'a str]) -> Result<Option<Stage<'a>>, SyntaxError> {
    if let Some(op) = segment.iter().find_map(|token| operator(token)) {
        return Err(SyntaxError::MisplacedOperator(op));
    }
    if segment.is_empty() {
        return Ok(None);
    }
    Ok(Some(Stage {
        argv: segment.to_vec(),
        redirections: Redirections::default(),
    }))
}

fn final_stage<'a>(
    segment: &[&'a str],
    background: &mut bool,
) -> Result<Option<Stage<'a>>, SyntaxError> {
    let mut argv = Vec::with_capacity(segment.len());
    let mut redirections = Redirections::default();
    let mut i = 0;

    while i < segment.len() {
        match segment[i] {
            BACKGROUND => {
                if i + 1 != segment.len() {
                    return Err(SyntaxError::MisplacedOperator(BACKGROUND));
                }
                *background = true;
            }
            INPUT => {
                i += 1;
                redirections.set_input(expect_target(segment, i, INPUT)?);
            }
            TRUNCATE => {
                i += 1;
                redirections.set_output(expect_target(segment, i, TRUNCATE)?, OutputMode::Truncate);
            }
            APPEND => {
                i += 1;
                redirections.set_output(expect_target(segment, i, APPEND)?, OutputMode::Append);
            }
            word => argv.push(word),
        }
        i += 1;
    }

    if argv.is_empty() {
        if redirections.is_empty() {
            return Ok(None);
        }
        return Err(SyntaxError::MissingCommand);
    }

    Ok(Some(Stage { argv, redirections }))
}

fn expect_target<'a>(
    segment: &[&'a str],
    i: usize,
    op: &'static str,
) -> Result<&'a str, SyntaxError> {
    match segment.get(i) {
        Some(token) if operator(token).is_none() => Ok(*token),
        _ => Err(SyntaxError::MissingTarget(op)),
    }
}
