// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;
use std::future::Future;
use std::time::Duration;

use tokio::select;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::error::ErrorReport;
use crate::error::Fallible;

/// Why a request stopped before producing a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
    /// The request outlived its timeout.
    Timeout,
    /// The cancellation token fired: a newer query, or the user hit Ctrl-C.
    Signal,
}

/// How a request can end other than with a value. A cancelled request is
/// never shown to the user as an error.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestError {
    Cancelled(CancelReason),
    Failed(String),
}

impl RequestError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RequestError::Cancelled(_))
    }
}

impl Display for RequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Cancelled(CancelReason::Timeout) => write!(f, "request timed out"),
            RequestError::Cancelled(CancelReason::Signal) => write!(f, "request cancelled"),
            RequestError::Failed(message) => write!(f, "{message}"),
        }
    }
}

impl From<RequestError> for ErrorReport {
    fn from(value: RequestError) -> Self {
        ErrorReport::new(value.to_string())
    }
}

/// Run `request` until it finishes, the token fires, or `limit` elapses,
/// whichever comes first. The losing futures are dropped, which aborts any
/// HTTP exchange in flight.
pub async fn cancellable<T, F>(
    signal: &CancellationToken,
    limit: Duration,
    request: F,
) -> Result<T, RequestError>
where
    F: Future<Output = Fallible<T>>,
{
    if signal.is_cancelled() {
        return Err(RequestError::Cancelled(CancelReason::Signal));
    }
    select! {
        biased;
        _ = signal.cancelled() => Err(RequestError::Cancelled(CancelReason::Signal)),
        outcome = timeout(limit, request) => match outcome {
            Err(_) => Err(RequestError::Cancelled(CancelReason::Timeout)),
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(RequestError::Failed(e.message().to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::future::pending;

    use tokio::spawn;
    use tokio::time::sleep;

    use super::*;
    use crate::error::fail;

    const LIMIT: Duration = Duration::from_secs(9);

    #[tokio::test(start_paused = true)]
    async fn test_completes() {
        let signal = CancellationToken::new();
        let result = cancellable(&signal, LIMIT, async {
            sleep(Duration::from_secs(1)).await;
            Ok(7)
        })
        .await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_cancellation() {
        let signal = CancellationToken::new();
        let result: Result<(), _> = cancellable(&signal, LIMIT, async {
            sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;
        assert_eq!(result, Err(RequestError::Cancelled(CancelReason::Timeout)));
        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_wins_over_slow_request() {
        let signal = CancellationToken::new();
        let trigger = signal.clone();
        spawn(async move {
            sleep(Duration::from_secs(2)).await;
            trigger.cancel();
        });
        let result: Result<(), _> = cancellable(&signal, LIMIT, async {
            sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert_eq!(result, Err(RequestError::Cancelled(CancelReason::Signal)));
    }

    #[tokio::test]
    async fn test_already_cancelled_returns_immediately() {
        let signal = CancellationToken::new();
        signal.cancel();
        let result: Result<(), _> = cancellable(&signal, LIMIT, pending::<Fallible<()>>()).await;
        assert_eq!(result, Err(RequestError::Cancelled(CancelReason::Signal)));
    }

    #[tokio::test]
    async fn test_failure_keeps_message() {
        let signal = CancellationToken::new();
        let result: Result<(), _> = cancellable(&signal, LIMIT, async { fail("HTTP 500") }).await;
        let err = result.unwrap_err();
        assert_eq!(err, RequestError::Failed("HTTP 500".to_string()));
        assert!(!err.is_cancelled());
        assert_eq!(ErrorReport::from(err).to_string(), "error: HTTP 500");
    }
}
