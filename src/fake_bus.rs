//! In-memory I2C bus used by the unit tests.

use embedded_hal_async::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Write(Vec<u8>),
    Read(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub address: u8,
    pub ops: Vec<Op>,
}

pub struct FakeBus {
    pub transactions: Vec<Transaction>,
    /// Bytes served to each read operation, from the start.
    pub response: Vec<u8>,
    fail: bool,
    hang: bool,
}

impl FakeBus {
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
            response: Vec::new(),
            fail: false,
            hang: false,
        }
    }

    pub fn with_response(response: &[u8]) -> Self {
        Self {
            response: response.to_vec(),
            ..Self::new()
        }
    }

    /// NACKs every transaction after scribbling over the read buffers.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::new()
        }
    }

    pub fn last(&self) -> &Transaction {
        self.transactions.last().expect("no transaction recorded")
    }
}

impl ErrorType for FakeBus {
    type Error = ErrorKind;
}

impl I2c for FakeBus {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.hang {
            core::future::pending::<()>().await;
        }
        let mut ops = Vec::new();
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => ops.push(Op::Write(bytes.to_vec())),
                Operation::Read(buf) => {
                    ops.push(Op::Read(buf.len()));
                    if self.fail {
                        buf.fill(0xAA);
                    } else {
                        for (i, b) in buf.iter_mut().enumerate() {
                            *b = self.response.get(i).copied().unwrap_or(0);
                        }
                    }
                }
            }
        }
        self.transactions.push(Transaction { address, ops });
        if self.fail {
            Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
        } else {
            Ok(())
        }
    }
}
