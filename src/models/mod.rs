pub mod employer;
pub mod salary;
pub mod vacancy;
pub mod vacancy_row;
