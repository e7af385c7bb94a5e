// SPDX-License-Identifier: GPL-3.0-or-later
use std::panic;

use tokio::task::JoinError;

mod stream;

pub(crate) use stream::StreamExt;

/// Collapse the result of a blocking task into a single [`anyhow::Result`].
///
/// Panics inside the task are resumed on the current thread instead of being turned into an
/// error.
pub(crate) fn flatten_join_result<T, E>(
    join_result: Result<Result<T, E>, JoinError>,
) -> anyhow::Result<T>
where
    anyhow::Error: From<E>,
{
    match join_result {
        Ok(inner_result) => Ok(inner_result?),
        Err(join_error) => {
            if join_error.is_panic() {
                panic::resume_unwind(join_error.into_panic());
            } else {
                Err(join_error.into())
            }
        }
    }
}
