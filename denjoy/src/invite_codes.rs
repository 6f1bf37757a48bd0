//! Beta invite code generation and issuance.
//!
//! Codes look like `DENJOY-7KQ2-M9XA`: a configurable prefix and two 4-character groups drawn
//! from an alphabet without the look-alikes 0/O and 1/I.

use rand::Rng;
use tracing::{instrument, warn};

use crate::{
    config::InviteCodesConfig,
    db::{
        Store,
        handlers::invite_codes::CODE_CONSTRAINT,
        models::invite_codes::{InviteCode, InviteCodeCreateDBRequest, UsageMode},
    },
    errors::Error,
    types::UserId,
};

pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const GROUP_LEN: usize = 4;
const GROUPS: usize = 2;

/// Generate one code with the given prefix.
pub fn generate_code<R: Rng + ?Sized>(prefix: &str, rng: &mut R) -> String {
    let mut code = String::with_capacity(prefix.len() + GROUPS * (GROUP_LEN + 1));
    code.push_str(prefix);
    for _ in 0..GROUPS {
        code.push('-');
        for _ in 0..GROUP_LEN {
            let idx = rng.gen_range(0..CODE_ALPHABET.len());
            code.push(CODE_ALPHABET[idx] as char);
        }
    }
    code
}

/// Canonical form used for lookups: trimmed and upper-cased.
pub fn normalize_code(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Insert a freshly generated code, regenerating on collisions with an existing code.
///
/// Gives up with an internal error after `max_generation_attempts` collisions.
#[instrument(skip(store, config, memo), err)]
pub async fn issue_code(
    store: &dyn Store,
    config: &InviteCodesConfig,
    usage_mode: UsageMode,
    memo: Option<String>,
    created_by: Option<UserId>,
) -> Result<InviteCode, Error> {
    for attempt in 1..=config.max_generation_attempts {
        let code = generate_code(&config.prefix, &mut rand::thread_rng());
        let request = InviteCodeCreateDBRequest {
            code,
            usage_mode,
            memo: memo.clone(),
            created_by,
        };

        match store.create_invite_code(&request).await {
            Ok(created) => return Ok(created),
            Err(e) if e.is_unique_violation_on(CODE_CONSTRAINT) => {
                warn!(attempt, "Generated invite code collided with an existing code, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::Internal {
        operation: format!(
            "generate a unique invite code after {} attempts",
            config.max_generation_attempts
        ),
    })
}
