pub mod init;
pub mod mock_exam;
pub mod overall_level;
pub mod simulate;
