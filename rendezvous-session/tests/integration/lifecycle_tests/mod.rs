mod test_drop_leaves_session;
mod test_leave_before_answer;
