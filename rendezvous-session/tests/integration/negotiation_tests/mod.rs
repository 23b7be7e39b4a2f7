mod test_stored_offer_wins;
