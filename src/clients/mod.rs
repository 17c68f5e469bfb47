pub mod envelope;
pub mod question_bank;
pub mod question_bank_client;

pub use question_bank::QuestionBankApi;
pub use question_bank_client::QuestionBankClient;
