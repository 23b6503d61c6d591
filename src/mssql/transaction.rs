use tiberius::Query;

use super::client::MssqlClient;

/// Transaction control statements issued on a SQL Server client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TxControl {
    Begin,
    Commit,
    Rollback,
}

impl TxControl {
    fn statement(self) -> &'static str {
        match self {
            TxControl::Begin => "BEGIN TRANSACTION",
            TxControl::Commit => "COMMIT TRANSACTION",
            TxControl::Rollback => "ROLLBACK TRANSACTION",
        }
    }
}

pub(super) async fn run_control(client: &mut MssqlClient, control: TxControl) -> tiberius::Result<()> {
    Query::new(control.statement()).execute(client).await?;
    Ok(())
}
